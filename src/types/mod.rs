mod currency;
mod event;
mod order;

pub use currency::{CurrencySnapshot, RegisteredCurrency};
pub use event::*;
pub use order::{Order, OrderSide};

/// Ordering context supplied by the transport: block number on EVM chains.
pub type Slot = u64;

/// Generation of the currency cache, incremented by every completed refresh.
pub type Generation = u64;

/// Position of an event in chain history.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct SlotContext {
    slot: Slot,
    tx_hash: alloy::primitives::TxHash,
    log_index: u64,
}

impl SlotContext {
    pub fn new(slot: Slot, tx_hash: alloy::primitives::TxHash, log_index: u64) -> Self {
        Self {
            slot,
            tx_hash,
            log_index,
        }
    }

    /// Context without transaction details, used by synthetic events.
    pub fn at(slot: Slot) -> Self {
        Self {
            slot,
            ..Default::default()
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn tx_hash(&self) -> alloy::primitives::TxHash {
        self.tx_hash
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }
}
