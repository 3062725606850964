//! Example: Print all order updates of a locally deployed market.
//!
//! Run with: cargo run --example print_orders -- <market address>

use std::time::Duration;

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use dex_order_feed::{
    Market, feed::OrderFeed, source::ContractCurrencySource, transport::LogTransport,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let address = std::env::args()
        .nth(1)
        .ok_or("market address expected")?
        .parse()?;

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(10, 100, 200))
        .connect("http://127.0.0.1:8545")
        .await?;
    client.set_poll_interval(Duration::from_millis(500));
    let provider = ProviderBuilder::new().connect_client(client);

    let market = Market::custom(provider.get_chain_id().await?, address, 0);

    let feed = OrderFeed::new(
        LogTransport::new(&market, provider.clone()),
        ContractCurrencySource::new(&market, provider),
    );
    feed.set_event_handler(|kind, order, context| match order {
        Some(order) => println!(
            "Slot {} - {} order {} {:?} {} @ {}",
            context.slot(),
            kind,
            order.id(),
            order.side(),
            order.quantity_remaining(),
            order.price(),
        ),
        None => println!("Slot {} - {} in unknown currency", context.slot(), kind),
    });

    feed.initialize().await?;
    println!(
        "Listening for orders, {} currencies known...\n",
        feed.currencies().len()
    );

    // Updates are printed by the handler on the transport task
    loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}
