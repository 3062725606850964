use std::fmt::Display;

use alloy::{contract, primitives::Address, sol_types, transports};

use crate::{feed::FeedState, transport::SubscriptionId};

/// Error returned by the feed, its transport or currency source.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("market program not found at {0}")]
    SchemaUnavailable(Address),

    #[error("chain mismatch, expected: {0}, got: {1}")]
    ChainMismatch(u64, u64),

    #[error("currency cache bootstrap failed: {0}")]
    Bootstrap(Box<FeedError>),

    #[error("operation not allowed in state {0:?}")]
    InvalidState(FeedState),

    #[error("unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),

    #[error("transport is not connected")]
    NotConnected,
}

impl From<contract::Error> for FeedError {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(_) => Self::Transport(value.to_string()),
            contract::Error::ContractNotDeployed => Self::InvalidRequest(value.to_string()),
            _ => Self::Fatal(value.to_string()),
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for FeedError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if ((resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found")))
                    || (resp.code == -32603
                        && (msg.contains("block by number") || msg.contains("getting block")))
                {
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<sol_types::Error> for FeedError {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}
