//! Order feed: wires the transport, currency cache, translator and
//! dispatcher together.
//!
//! ```text
//! transport ─┬─ OrderCreated / OrderExchanged / OrderCanceled ─> translate ─> dispatcher ─> consumer
//!            └─ CurrencyRegistered ─> currency cache refresh
//! ```
//!
//! Lifecycle: [`FeedState::Uninitialized`] ─ [`OrderFeed::initialize`] ─>
//! [`FeedState::Initializing`] ─> [`FeedState::Active`] ─ [`OrderFeed::shutdown`] ─>
//! [`FeedState::Closed`].

use std::sync::Arc;

use futures::{FutureExt, future};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    cache::CurrencyCache,
    dispatch::{Dispatcher, OrderReceiver},
    error::FeedError,
    source::CurrencySource,
    stream::RawEventContext,
    subscription::SubscriptionRegistry,
    translate::translate,
    transport::{EventTransport, RawEventHandler},
    types::{CurrencySnapshot, EventCategory, EventKind, Order, OrderSide, RawEvent, SlotContext},
};

/// Lifecycle state of the [`OrderFeed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedState {
    Uninitialized,

    /// Transport is connecting and currency cache bootstrap is in flight.
    Initializing,

    /// Subscribed and dispatching.
    Active,

    /// Unsubscribed, no more updates are delivered.
    Closed,
}

/// Translates market events into [`Order`] updates for a single consumer.
pub struct OrderFeed<T, Q> {
    transport: Arc<T>,
    cache: Arc<CurrencyCache<Q>>,
    dispatcher: Arc<Dispatcher>,
    registry: SubscriptionRegistry,
    state: Mutex<FeedState>,
}

impl<T: EventTransport, Q: CurrencySource> OrderFeed<T, Q> {
    pub fn new(transport: T, source: Q) -> Self {
        Self::with_shared(Arc::new(transport), Arc::new(source))
    }

    /// Creates feed over transport and source shared with the caller.
    pub fn with_shared(transport: Arc<T>, source: Arc<Q>) -> Self {
        Self {
            transport,
            cache: Arc::new(CurrencyCache::new(source)),
            dispatcher: Arc::new(Dispatcher::new()),
            registry: SubscriptionRegistry::new(),
            state: Mutex::new(FeedState::Uninitialized),
        }
    }

    /// Connects the transport, bootstraps the currency cache and only then
    /// subscribes event handlers, so no order is translated against an
    /// empty cache.
    ///
    /// On failure the feed returns to [`FeedState::Uninitialized`] and
    /// can be initialized again.
    pub async fn initialize(&self) -> Result<(), FeedError> {
        {
            let mut state = self.state.lock();
            if *state != FeedState::Uninitialized {
                return Err(FeedError::InvalidState(*state));
            }
            *state = FeedState::Initializing;
        }

        match self.start().await {
            Ok(()) => {
                *self.state.lock() = FeedState::Active;
                info!(
                    generation = self.cache.generation(),
                    currencies = self.cache.snapshot().len(),
                    "Order feed active"
                );
                Ok(())
            }
            Err(e) => {
                error!(%e, "Order feed initialization failed");
                self.registry.unsubscribe_all(&*self.transport);
                self.transport.disconnect();
                self.cache.clear();
                *self.state.lock() = FeedState::Uninitialized;
                Err(e)
            }
        }
    }

    async fn start(&self) -> Result<(), FeedError> {
        self.transport.connect().await?;

        let generation = self.cache.bootstrap().await?;
        debug!(generation, "Currency cache bootstrapped");

        self.registry
            .subscribe_all(&*self.transport, |category| self.route(category))?;
        self.transport.listen()
    }

    fn route(&self, category: EventCategory) -> RawEventHandler {
        let cache = self.cache.clone();
        match category {
            EventCategory::CurrencyRegistered => Arc::new(move |event: RawEventContext| {
                handle_currency_registered(cache.clone(), event).boxed()
            }),
            _ => {
                let dispatcher = self.dispatcher.clone();
                Arc::new(move |event: RawEventContext| {
                    handle_order_event(&cache.snapshot(), &dispatcher, &event);
                    future::ready(()).boxed()
                })
            }
        }
    }

    /// Sets the consumer callback, replacing the previous one.
    ///
    /// The callback is invoked once per order event, with `None` in place of
    /// the order if it references a currency unknown at translation time.
    pub fn set_event_handler<F>(&self, handler: F)
    where
        F: Fn(EventKind, Option<&Order>, SlotContext) + Send + Sync + 'static,
    {
        if self.dispatcher.set_handler(handler) {
            debug!("Event handler replaced");
        }
    }

    /// Replaces the consumer callback with a channel.
    pub fn events(&self) -> OrderReceiver {
        self.dispatcher.channel()
    }

    /// Unsubscribes from the transport, drops the consumer callback and
    /// releases the currency cache.
    ///
    /// Repeated calls are no-op.
    pub fn shutdown(&self) -> Result<(), FeedError> {
        {
            let mut state = self.state.lock();
            match *state {
                FeedState::Closed => return Ok(()),
                FeedState::Initializing => return Err(FeedError::InvalidState(*state)),
                FeedState::Uninitialized | FeedState::Active => *state = FeedState::Closed,
            }
        }

        self.registry.unsubscribe_all(&*self.transport);
        self.transport.disconnect();
        self.dispatcher.clear_handler();
        self.cache.clear();
        info!("Order feed closed");
        Ok(())
    }

    pub fn state(&self) -> FeedState {
        *self.state.lock()
    }

    /// Currencies as of the last completed refresh.
    pub fn currencies(&self) -> Arc<CurrencySnapshot> {
        self.cache.snapshot()
    }

    pub fn cache(&self) -> &CurrencyCache<Q> {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn handle_order_event(currencies: &CurrencySnapshot, dispatcher: &Dispatcher, event: &RawEventContext) {
    let (Some(kind), Some(log)) = (event.event().category().kind(), event.event().order()) else {
        warn!(category = %event.event().category(), slot = event.slot(), "Unexpected event routed to order handler");
        return;
    };

    if !OrderSide::is_known_discriminant(log.side) {
        warn!(
            order_id = log.order_id,
            side = log.side,
            slot = event.slot(),
            "Unknown order side discriminant, treating as sell"
        );
    }

    let order = translate(log, currencies);
    if order.is_none() {
        debug!(
            %kind,
            order_id = log.order_id,
            currency = %log.currency_mint,
            generation = currencies.generation(),
            slot = event.slot(),
            "Order references unknown currency"
        );
    }
    dispatcher.emit(kind, order.as_ref(), event.context());
}

async fn handle_currency_registered<Q: CurrencySource>(
    cache: Arc<CurrencyCache<Q>>,
    event: RawEventContext,
) {
    let RawEvent::CurrencyRegistered(registered) = *event.event() else {
        warn!(category = %event.event().category(), slot = event.slot(), "Unexpected event routed to currency handler");
        return;
    };

    match cache.refresh(true).await {
        Ok(generation) => {
            if cache.lookup(&registered.mint).is_none() {
                warn!(
                    mint = %registered.mint,
                    generation,
                    "Registered currency is missing from refreshed currency set"
                );
            }
            info!(
                mint = %registered.mint,
                decimals = registered.decimals,
                generation,
                slot = event.slot(),
                "Currency registered"
            );
        }
        Err(e) => {
            warn!(
                ?e,
                mint = %registered.mint,
                slot = event.slot(),
                "Currency cache refresh failed, keeping previous currencies"
            );
        }
    }
}
