//! On-chain order feed.
//!
//! # Overview
//!
//! Listens to the events emitted by the on-chain market program, translates
//! order lifecycle events into normalized [`types::Order`]s and hands them
//! over to a single consumer callback, in the order the transport delivers them.
//!
//! Order events reference their quote currency by mint address only, the
//! decimal precision needed to render a price lives in the
//! [`cache::CurrencyCache`], which is bootstrapped before any handler is
//! subscribed and refreshed wholesale on every `CurrencyRegistered` event.
//!
//! Use [`feed::OrderFeed`] with [`transport::LogTransport`] and
//! [`source::ContractCurrencySource`] to follow a deployed market, or plug
//! custom [`transport::EventTransport`] / [`source::CurrencySource`]
//! implementations.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Current version relies on log polling to implement reliably continuous
//!   stream of events. WebSocket subscriptions would lower the latency.
//!
//! * No checkpointing: a restarted feed starts from the chain head again.
//!
//! # Testing
//!
//! [`testing`] module provides an in-memory transport and currency source
//! to drive the feed without a node.

pub mod abi;
pub mod cache;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod num;
pub mod source;
pub mod stream;
pub mod subscription;
pub mod testing;
pub mod translate;
pub mod transport;
pub mod types;

use alloy::primitives::Address;

#[derive(Clone, Debug)]
/// Market program deployment the feed is following.
pub struct Market {
    chain_id: u64,
    address: Address,
    deployed_at_block: u64,
}

impl Market {
    pub fn custom(chain_id: u64, address: Address, deployed_at_block: u64) -> Self {
        Self {
            chain_id,
            address,
            deployed_at_block,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn deployed_at_block(&self) -> u64 {
        self.deployed_at_block
    }
}
