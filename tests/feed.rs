use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use alloy::primitives::Address;
use dex_order_feed::{
    error::FeedError,
    feed::OrderFeed,
    testing::{self, MockTransport, OrderLogBuilder, StaticCurrencySource},
    types::{EventKind, OrderSide},
};
use fastnum::udec64;
use tokio_test::assert_ok;

fn mint_a() -> Address {
    Address::repeat_byte(0xa1)
}

fn mint_b() -> Address {
    Address::repeat_byte(0xb2)
}

async fn active_feed(
    currencies: &[(Address, u8)],
) -> (OrderFeed<MockTransport, StaticCurrencySource>, Arc<StaticCurrencySource>) {
    let source = Arc::new(StaticCurrencySource::with_decimals(currencies));
    let feed = OrderFeed::with_shared(Arc::new(MockTransport::new()), source.clone());
    assert_ok!(feed.initialize().await);
    (feed, source)
}

/// Order for a known currency is translated and dispatched
/// along with its slot.
#[tokio::test]
async fn test_order_created_translated() {
    let (feed, _) = active_feed(&[(mint_a(), 6)]).await;
    let mut rx = feed.events();

    let event = OrderLogBuilder::new(mint_a())
        .order_id(77)
        .side(0)
        .price(2_000_000)
        .quantities(10, 20)
        .created();
    assert_ok!(feed.transport().deliver(100, event).await);

    let update = rx.try_recv().expect("update dispatched");
    assert_eq!(update.kind, EventKind::OrderAdded);
    assert_eq!(update.context.slot(), 100);

    let order = update.order.expect("order translated");
    assert_eq!(order.id(), "77");
    assert_eq!(order.side(), OrderSide::Buy);
    assert_eq!(order.price(), udec64!(2.0));
    assert_eq!(order.quantity_remaining(), 10);
    assert_eq!(order.origination_quantity(), 20);
    assert_eq!(order.currency_mint(), mint_a());

    assert!(rx.try_recv().is_none());
}

/// Order for an unknown currency is still dispatched, without the order.
#[tokio::test]
async fn test_order_with_unknown_currency_dispatched_as_absent() {
    let (feed, _) = active_feed(&[(mint_a(), 6)]).await;
    let mut rx = feed.events();

    assert_ok!(
        feed.transport()
            .deliver(101, OrderLogBuilder::new(mint_b()).created())
            .await
    );
    assert_ok!(
        feed.transport()
            .deliver(102, OrderLogBuilder::new(mint_b()).canceled())
            .await
    );

    let update = rx.try_recv().unwrap();
    assert_eq!(update.kind, EventKind::OrderAdded);
    assert!(update.order.is_none());
    assert_eq!(update.context.slot(), 101);

    let update = rx.try_recv().unwrap();
    assert_eq!(update.kind, EventKind::OrderRemoved);
    assert!(update.order.is_none());
    assert_eq!(update.context.slot(), 102);
}

/// Currency registration refreshes the cache, emits nothing, and later
/// orders in that currency get translated with its decimals.
#[tokio::test]
async fn test_currency_registration_refreshes_cache() {
    let (feed, source) = active_feed(&[(mint_a(), 6)]).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    feed.set_event_handler(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    source.register(mint_b(), 2);
    assert_ok!(
        feed.transport()
            .deliver(102, testing::currency_registered(mint_b(), 2))
            .await
    );

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(source.forced_calls(), 1);
    assert_eq!(feed.currencies().generation(), 2);
    assert_eq!(feed.cache().lookup(&mint_b()).unwrap().decimals(), 2);
    assert_eq!(feed.cache().lookup(&mint_a()).unwrap().decimals(), 6);

    let mut rx = feed.events();
    assert_ok!(
        feed.transport()
            .deliver(103, OrderLogBuilder::new(mint_b()).price(250).side(1).created())
            .await
    );
    let order = rx.try_recv().unwrap().order.unwrap();
    assert_eq!(order.price(), udec64!(2.5));
    assert_eq!(order.side(), OrderSide::Sell);
}

/// Failed refresh keeps serving the previously known currencies.
#[tokio::test]
async fn test_failed_registration_refresh_keeps_stale_cache() {
    let (feed, source) = active_feed(&[(mint_a(), 6)]).await;
    let mut rx = feed.events();

    source.register(mint_b(), 2);
    source.fail_next(FeedError::Timeout);
    assert_ok!(
        feed.transport()
            .deliver(200, testing::currency_registered(mint_b(), 2))
            .await
    );

    assert_eq!(feed.currencies().generation(), 1);
    assert!(feed.cache().lookup(&mint_b()).is_none());
    assert!(rx.try_recv().is_none());

    assert_ok!(
        feed.transport()
            .deliver(201, OrderLogBuilder::new(mint_a()).price(3_000_000).created())
            .await
    );
    assert_ok!(
        feed.transport()
            .deliver(202, OrderLogBuilder::new(mint_b()).created())
            .await
    );
    assert_eq!(rx.try_recv().unwrap().order.unwrap().price(), udec64!(3));
    assert!(rx.try_recv().unwrap().order.is_none());

    // The next registration catches up
    assert_ok!(
        feed.transport()
            .deliver(203, testing::currency_registered(Address::repeat_byte(0xc3), 0))
            .await
    );
    assert_eq!(feed.cache().lookup(&mint_b()).unwrap().decimals(), 2);
}

/// Every order lifecycle category maps to its own update kind and the
/// delivery order is preserved.
#[tokio::test]
async fn test_lifecycle_kinds_in_delivery_order() {
    let (feed, _) = active_feed(&[(mint_a(), 3)]).await;
    let mut rx = feed.events();

    let order = OrderLogBuilder::new(mint_a()).order_id(5).price(1_250);
    for (slot, event) in [
        (10, order.clone().quantities(4, 4).created()),
        (11, order.clone().quantities(1, 4).exchanged()),
        (12, testing::currency_registered(mint_a(), 3)),
        (13, order.clone().quantities(0, 4).canceled()),
    ] {
        assert_ok!(feed.transport().deliver(slot, event).await);
    }

    let updates = std::iter::from_fn(|| rx.try_recv()).collect::<Vec<_>>();
    assert_eq!(
        updates
            .iter()
            .map(|u| (u.kind, u.context.slot()))
            .collect::<Vec<_>>(),
        vec![
            (EventKind::OrderAdded, 10),
            (EventKind::OrderModified, 11),
            (EventKind::OrderRemoved, 13),
        ]
    );
    let remaining = updates
        .iter()
        .map(|u| u.order.as_ref().unwrap().quantity_remaining())
        .collect::<Vec<_>>();
    assert_eq!(remaining, vec![4, 1, 0]);
    assert!(updates.iter().all(|u| u.order.as_ref().unwrap().price() == udec64!(1.25)));
}

/// Out-of-range side discriminant is coerced to sell.
#[tokio::test]
async fn test_unknown_side_treated_as_sell() {
    let (feed, _) = active_feed(&[(mint_a(), 0)]).await;
    let mut rx = feed.events();

    assert_ok!(
        feed.transport()
            .deliver(1, OrderLogBuilder::new(mint_a()).side(3).created())
            .await
    );
    assert_eq!(rx.try_recv().unwrap().order.unwrap().side(), OrderSide::Sell);
}

/// Without a consumer, order events are dropped quietly.
#[tokio::test]
async fn test_no_handler_registered() {
    let (feed, _) = active_feed(&[(mint_a(), 6)]).await;

    assert_ok!(
        feed.transport()
            .deliver(1, OrderLogBuilder::new(mint_a()).created())
            .await
    );
    assert_ok!(
        feed.transport()
            .deliver(2, OrderLogBuilder::new(mint_b()).created())
            .await
    );
}

/// Setting a handler replaces the previous one.
#[tokio::test]
async fn test_handler_replaced() {
    let (feed, _) = active_feed(&[(mint_a(), 6)]).await;
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let counter = first.clone();
    feed.set_event_handler(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_ok!(
        feed.transport()
            .deliver(1, OrderLogBuilder::new(mint_a()).created())
            .await
    );

    let counter = second.clone();
    feed.set_event_handler(move |kind, order, context| {
        assert_eq!(kind, EventKind::OrderAdded);
        assert!(order.is_none());
        assert_eq!(context.slot(), 2);
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_ok!(
        feed.transport()
            .deliver(2, OrderLogBuilder::new(mint_b()).created())
            .await
    );

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}
