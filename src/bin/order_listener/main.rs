//! Order listener binary - follows a deployed market and prints
//! normalized order updates.

mod config;
mod error;

use std::process::exit;

use alloy::{
    providers::{DynProvider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use clap::Parser;
use dex_order_feed::{
    dispatch::OrderUpdate,
    feed::OrderFeed,
    source::ContractCurrencySource,
    transport::LogTransport,
};
use tracing::{error, info};
use url::Url;

use config::{CliConfig, EnvConfig};
use error::{Error, Result};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(env_config, cli_config).await {
        error!(%e, "Order listener encountered an error, shutting down");
        exit(1);
    }
}

async fn run(env_config: EnvConfig, cli_config: CliConfig) -> Result<()> {
    let market = env_config.market()?;
    let node_url = Url::parse(&env_config.node_rpc_url)?;

    info!(
        chain_id = market.chain_id(),
        market = %market.address(),
        %node_url,
        "Connecting"
    );

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(cli_config.retries, 100, 200))
        .http(node_url);
    client.set_poll_interval(cli_config.poll_interval());
    let provider = DynProvider::new(ProviderBuilder::new().connect_client(client));

    let mut transport = LogTransport::new(&market, provider.clone());
    if let Some(from_block) = cli_config.from_block {
        transport = transport.from_slot(from_block);
    }
    let feed = OrderFeed::new(transport, ContractCurrencySource::new(&market, provider));

    let mut updates = feed.events();
    feed.initialize().await?;
    info!(currencies = feed.currencies().len(), "Listening for order updates");

    while let Some(update) = updates.recv().await {
        if update.order.is_none() && cli_config.skip_untranslatable {
            continue;
        }
        print_update(&update);
    }

    feed.shutdown()?;
    Err(Error::FeedClosed)
}

fn print_update(update: &OrderUpdate) {
    match &update.order {
        Some(order) => println!(
            "[{:>10}] {:<13} #{:<8} {:<4} {} @ {} (remaining {}/{}) owner {}",
            update.context.slot(),
            update.kind,
            order.id(),
            format!("{:?}", order.side()),
            order.asset_mint(),
            order.price(),
            order.quantity_remaining(),
            order.origination_quantity(),
            order.owner(),
        ),
        None => println!(
            "[{:>10}] {:<13} untranslatable, tx {} log {}",
            update.context.slot(),
            update.kind,
            update.context.tx_hash(),
            update.context.log_index(),
        ),
    }
}
