use std::time::Duration;

use alloy::{
    providers::Provider,
    rpc::types::{Filter, Log},
    sol_types::{SolEvent, SolEventInterface},
};
use futures::{Stream, stream};
use tracing::{debug, trace};

use crate::{
    Market,
    abi::market::Market::{
        CurrencyRegistered, MarketEvents, OrderCanceled, OrderCreated, OrderExchanged,
    },
    error::FeedError,
    types::{self, RawEvent, Slot, SlotContext},
};

pub type RawEventContext = types::EventContext<RawEvent>;
pub type RawBlockEvents = types::BlockEvents<RawEventContext>;

/// Returns stream of raw events emitted by the market program,
/// batched per block, starting from the specified block.
///
/// Polls logs via the given [`Provider`] to produce strictly continuous
/// event sequence, with [`Provider`]-configured interval. Failed block is
/// yielded as an error and retried on the next poll.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::FallbackLayer`]
/// and/or [`alloy::transports::layers::RetryBackoffLayer`].
pub fn raw<P, S, SFut>(
    market: &Market,
    provider: P,
    from: Slot,
    sleep: S,
) -> impl Stream<Item = Result<RawBlockEvents, FeedError>> + use<P, S, SFut>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let address = market.address();
    stream::unfold(
        (provider, from),
        move |(provider, mut block_num)| async move {
            let filter = Filter::new()
                .address(address)
                .event_signature(vec![
                    OrderCreated::SIGNATURE_HASH,
                    OrderExchanged::SIGNATURE_HASH,
                    OrderCanceled::SIGNATURE_HASH,
                    CurrencyRegistered::SIGNATURE_HASH,
                ])
                .from_block(block_num)
                .to_block(block_num);
            loop {
                // Checking against the tip of the chain first: some nodes produce
                // empty response or an invalid request error instead of a proper
                // error in case the block in the filter does not exist yet
                let head_block_num = match provider.get_block_number().await {
                    Ok(head_block_num) => head_block_num,
                    Err(e) => return Some((Err(FeedError::from(e)), (provider, block_num))),
                };
                if head_block_num < block_num {
                    trace!(block_num, head_block_num, "Block is not available yet");
                    sleep(provider.client().poll_interval()).await;
                    continue;
                }

                // Once the block exists every error is reported, including
                // rejected filters, and the block is retried on the next poll
                let result = provider
                    .get_logs(&filter)
                    .await
                    .map_err(FeedError::from)
                    .and_then(|logs| decode_block(block_num, &logs));
                if result.is_ok() {
                    block_num += 1;
                }
                return Some((result, (provider, block_num)));
            }
        },
    )
}

fn decode_block(block_num: Slot, logs: &[Log]) -> Result<RawBlockEvents, FeedError> {
    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        if log.transaction_hash.is_none() || log.log_index.is_none() {
            debug!(
                block_num,
                tx_hash = ?log.transaction_hash,
                log_index = ?log.log_index,
                "Log without transaction context, recorded as zero"
            );
        }
        events.push(RawEventContext::new(
            SlotContext::new(
                block_num,
                log.transaction_hash.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
            ),
            MarketEvents::decode_log(&log.inner)?.data.into(),
        ));
    }
    Ok(RawBlockEvents::new(block_num, events))
}

#[cfg(test)]
mod tests {
    use std::{
        pin::pin,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use alloy::{
        primitives::{Address, U64, address},
        providers::{ProviderBuilder, mock::Asserter},
        rpc::client::RpcClient,
        transports::layers::RetryBackoffLayer,
    };
    use futures::StreamExt;

    use super::*;

    fn mocked_market() -> Market {
        Market::custom(1, Address::repeat_byte(0x01), 0)
    }

    #[tokio::test]
    async fn test_waits_until_block_available() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        let sleeps = AtomicUsize::new(0);
        let sleep = |_: Duration| {
            sleeps.fetch_add(1, Ordering::SeqCst);
            async {}
        };

        asserter.push_success(&U64::from(8));
        asserter.push_success(&U64::from(9));
        asserter.push_success(&U64::from(10));
        asserter.push_success(&Vec::<Log>::new());

        let mut events = pin!(raw(&mocked_market(), provider, 10, sleep));
        let block = events.next().await.unwrap().unwrap();
        assert_eq!(block.slot(), 10);
        assert!(block.events().is_empty());
        assert_eq!(sleeps.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_decode_block_keeps_log_position() {
        let registered = CurrencyRegistered {
            mint: Address::repeat_byte(0xb0),
            decimals: 2,
            registrar: Address::ZERO,
        };
        let inner = alloy::primitives::Log {
            address: Address::repeat_byte(0x01),
            data: registered.encode_log_data(),
        };
        let tx_hash = alloy::primitives::TxHash::repeat_byte(0x77);
        let logs = [
            Log {
                inner: inner.clone(),
                transaction_hash: Some(tx_hash),
                log_index: Some(3),
                ..Default::default()
            },
            // Pending log, position is not known yet
            Log {
                inner,
                ..Default::default()
            },
        ];

        let block = decode_block(7, &logs).unwrap();
        assert_eq!(block.slot(), 7);
        assert_eq!(block.events()[0].context(), SlotContext::new(7, tx_hash, 3));
        assert_eq!(block.events()[1].context(), SlotContext::at(7));
        assert!(matches!(
            block.events()[1].event(),
            RawEvent::CurrencyRegistered(e) if e.decimals == 2
        ));
    }

    #[tokio::test]
    async fn test_rejected_logs_request_is_reported() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        let sleeps = AtomicUsize::new(0);
        let sleep = |_: Duration| {
            sleeps.fetch_add(1, Ordering::SeqCst);
            async {}
        };

        // Block exists, but the node refuses the filter
        asserter.push_success(&U64::from(12));
        asserter.push_failure_msg("error getting block by number");
        asserter.push_success(&U64::from(12));
        asserter.push_success(&Vec::<Log>::new());

        let mut events = pin!(raw(&mocked_market(), provider, 10, sleep));
        assert!(events.next().await.unwrap().is_err());

        // Same block is retried on the next poll
        let block = events.next().await.unwrap().unwrap();
        assert_eq!(block.slot(), 10);
        assert_eq!(sleeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[ignore = "requires a node with the market program deployed"]
    async fn test_stream_recent_blocks() {
        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect("http://127.0.0.1:8545")
            .await
            .unwrap();
        client.set_poll_interval(Duration::from_millis(100));
        let provider = ProviderBuilder::new().connect_client(client);

        let market = Market::custom(
            1337,
            address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            0,
        );
        let mut block_num = provider.get_block_number().await.unwrap() + 1;
        let stream = raw(&market, provider, block_num, tokio::time::sleep);
        let block_results = stream.take(10).collect::<Vec<_>>().await;

        for b in &block_results {
            let b = b.as_ref().unwrap();
            assert_eq!(b.slot(), block_num);
            for e in b.events() {
                assert_eq!(e.slot(), block_num);
            }
            block_num += 1;
        }
    }
}
