//! Error types for the order listener.

use dex_order_feed::error::FeedError;

/// Main error type for the order listener.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Order feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(#[from] url::ParseError),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] alloy::primitives::hex::FromHexError),

    #[error("Order feed closed unexpectedly")]
    FeedClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
