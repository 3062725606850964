//! Configuration for the order listener.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details
//! - CLI arguments: polling and output options

use std::time::Duration;

use alloy::primitives::Address;
use clap::Parser;
use dex_order_feed::Market;

use crate::error::Result;

/// Environment configuration (connection details).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID the market is deployed on
    pub chain_id: u64,

    /// Market program address
    pub market_address: String,

    /// Block number when the market was deployed
    pub deployed_at_block: u64,

    /// RPC URL for the node
    pub node_rpc_url: String,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the market address.
    pub fn market_address(&self) -> std::result::Result<Address, alloy::primitives::hex::FromHexError> {
        self.market_address.parse()
    }

    /// Market deployment described by the environment.
    pub fn market(&self) -> Result<Market> {
        Ok(Market::custom(
            self.chain_id,
            self.market_address()?,
            self.deployed_at_block,
        ))
    }
}

/// CLI arguments of the order listener.
#[derive(Debug, Parser)]
#[command(name = "order_listener")]
#[command(about = "Listen to market order events and print normalized orders")]
pub struct CliConfig {
    /// Poll interval in milliseconds
    #[arg(short, long, default_value = "500")]
    pub poll_interval: u64,

    /// Block to start from (default: next block after the chain head)
    #[arg(short, long)]
    pub from_block: Option<u64>,

    /// Number of retries of rate-limited RPC requests
    #[arg(long, default_value = "10")]
    pub retries: u32,

    /// Do not print updates for orders in currencies unknown at translation time
    #[arg(long)]
    pub skip_untranslatable: bool,
}

impl CliConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(market_address: &str) -> EnvConfig {
        EnvConfig {
            chain_id: 1337,
            market_address: market_address.to_string(),
            deployed_at_block: 12,
            node_rpc_url: "http://127.0.0.1:8545".to_string(),
        }
    }

    #[test]
    fn test_env_config_to_market() {
        let market = env("0x5FbDB2315678afecb367f032d93F642f64180aa3")
            .market()
            .unwrap();
        assert_eq!(market.chain_id(), 1337);
        assert_eq!(market.deployed_at_block(), 12);
        assert_eq!(
            market.address(),
            alloy::primitives::address!("0x5FbDB2315678afecb367f032d93F642f64180aa3")
        );
    }

    #[test]
    fn test_invalid_market_address() {
        assert!(matches!(
            env("0xnot-an-address").market(),
            Err(crate::error::Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = CliConfig::parse_from(["order_listener"]);
        assert_eq!(cli.poll_interval(), Duration::from_millis(500));
        assert_eq!(cli.from_block, None);
        assert_eq!(cli.retries, 10);
        assert!(!cli.skip_untranslatable);

        let cli = CliConfig::parse_from(["order_listener", "-f", "100", "--skip-untranslatable"]);
        assert_eq!(cli.from_block, Some(100));
        assert!(cli.skip_untranslatable);
    }
}
