//! In-memory testing environment and test utilities.
//!
//! [`MockTransport`] is an [`EventTransport`] with manual event delivery, while
//! [`StaticCurrencySource`] serves a configurable set of currencies and can
//! be told to fail. Together they drive [`crate::feed::OrderFeed`] without a node.
//!
//! [`OrderLogBuilder`] provides a convenient way to create raw order events
//! with controlled values.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use alloy::primitives::Address;
use parking_lot::Mutex;

use crate::{
    error::FeedError,
    source::CurrencySource,
    stream::RawEventContext,
    transport::{EventTransport, RawEventHandler, Routes, SubscriptionId},
    types::{CurrencyLog, EventCategory, OrderLog, RawEvent, RegisteredCurrency, Slot, SlotContext},
};

#[derive(Default)]
pub struct MockTransport {
    routes: Routes,
    connected: AtomicBool,
    listening: AtomicBool,
    connects: AtomicUsize,
    connect_error: Mutex<Option<FeedError>>,
    subscribe_budget: Mutex<Option<usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next [`EventTransport::connect`] fail with the given error.
    pub fn fail_connect(&self, error: FeedError) {
        *self.connect_error.lock() = Some(error);
    }

    /// Allows only `n` more successful subscriptions.
    pub fn fail_subscribe_after(&self, n: usize) {
        *self.subscribe_budget.lock() = Some(n);
    }

    pub fn subscription_count(&self) -> usize {
        self.routes.len()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Delivers the event at the given slot, waiting for all handlers to complete.
    pub async fn deliver(&self, slot: Slot, event: RawEvent) -> Result<(), FeedError> {
        self.deliver_context(RawEventContext::new(SlotContext::at(slot), event))
            .await
    }

    pub async fn deliver_context(&self, event: RawEventContext) -> Result<(), FeedError> {
        if !self.is_listening() {
            return Err(FeedError::NotConnected);
        }
        self.routes.deliver(event).await;
        Ok(())
    }
}

impl EventTransport for MockTransport {
    async fn connect(&self) -> Result<(), FeedError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let error = self.connect_error.lock().take();
        if let Some(e) = error {
            return Err(e);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(
        &self,
        category: EventCategory,
        handler: RawEventHandler,
    ) -> Result<SubscriptionId, FeedError> {
        if let Some(budget) = self.subscribe_budget.lock().as_mut() {
            if *budget == 0 {
                return Err(FeedError::Transport("subscription rejected".to_string()));
            }
            *budget -= 1;
        }
        Ok(self.routes.subscribe(category, handler))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError> {
        self.routes.unsubscribe(id)
    }

    fn listen(&self) -> Result<(), FeedError> {
        if !self.is_connected() {
            return Err(FeedError::NotConnected);
        }
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.listening.store(false, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        self.routes.clear();
    }
}

/// [`CurrencySource`] serving a settable list of currencies.
#[derive(Default)]
pub struct StaticCurrencySource {
    currencies: Mutex<Vec<RegisteredCurrency>>,
    failures: Mutex<VecDeque<FeedError>>,
    calls: AtomicUsize,
    forced_calls: AtomicUsize,
}

impl StaticCurrencySource {
    pub fn new(currencies: Vec<RegisteredCurrency>) -> Self {
        Self {
            currencies: Mutex::new(currencies),
            ..Default::default()
        }
    }

    /// Source of currencies with the given `(mint, decimals)`.
    pub fn with_decimals(currencies: &[(Address, u8)]) -> Self {
        Self::new(to_currencies(currencies))
    }

    pub fn set(&self, currencies: Vec<RegisteredCurrency>) {
        *self.currencies.lock() = currencies;
    }

    pub fn set_decimals(&self, currencies: &[(Address, u8)]) {
        self.set(to_currencies(currencies));
    }

    /// Adds currency to the served list, as the market does on registration.
    pub fn register(&self, mint: Address, decimals: u8) {
        let mut currencies = self.currencies.lock();
        let registered_at = currencies.len() as u64 + 1;
        currencies.push(RegisteredCurrency::new(mint, decimals, Address::ZERO, registered_at));
    }

    /// Makes the next fetch fail with the given error, failures queue up.
    pub fn fail_next(&self, error: FeedError) {
        self.failures.lock().push_back(error);
    }

    /// Number of fetches, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fetches with `force_refresh` set.
    pub fn forced_calls(&self) -> usize {
        self.forced_calls.load(Ordering::SeqCst)
    }
}

impl CurrencySource for StaticCurrencySource {
    async fn fetch_all_registered_currencies(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<RegisteredCurrency>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if force_refresh {
            self.forced_calls.fetch_add(1, Ordering::SeqCst);
        }
        let failure = self.failures.lock().pop_front();
        match failure {
            Some(e) => Err(e),
            None => Ok(self.currencies.lock().clone()),
        }
    }
}

fn to_currencies(currencies: &[(Address, u8)]) -> Vec<RegisteredCurrency> {
    currencies
        .iter()
        .enumerate()
        .map(|(i, (mint, decimals))| {
            RegisteredCurrency::new(*mint, *decimals, Address::ZERO, i as u64 + 1)
        })
        .collect()
}

/// Builder of [`OrderLog`] test values.
#[derive(Clone, Debug)]
pub struct OrderLogBuilder {
    log: OrderLog,
}

impl OrderLogBuilder {
    /// Buy order for a single unit at raw price `1`, quoted in the given currency.
    pub fn new(currency_mint: Address) -> Self {
        Self {
            log: OrderLog {
                order_id: 1,
                side: 0,
                asset_mint: Address::repeat_byte(0xee),
                currency_mint,
                price: 1,
                quantity_remaining: 1,
                origination_quantity: 1,
                owner: Address::repeat_byte(0x01),
                owner_asset_account: Address::repeat_byte(0x02),
                owner_currency_account: Address::repeat_byte(0x03),
                created_at: 0,
            },
        }
    }

    pub fn order_id(mut self, order_id: u64) -> Self {
        self.log.order_id = order_id;
        self
    }

    pub fn side(mut self, side: u8) -> Self {
        self.log.side = side;
        self
    }

    pub fn asset_mint(mut self, asset_mint: Address) -> Self {
        self.log.asset_mint = asset_mint;
        self
    }

    pub fn price(mut self, price: u64) -> Self {
        self.log.price = price;
        self
    }

    /// Sets remaining and originally requested quantity.
    pub fn quantities(mut self, remaining: u64, origination: u64) -> Self {
        self.log.quantity_remaining = remaining;
        self.log.origination_quantity = origination;
        self
    }

    pub fn owner(mut self, owner: Address) -> Self {
        self.log.owner = owner;
        self
    }

    pub fn created_at(mut self, created_at: i64) -> Self {
        self.log.created_at = created_at;
        self
    }

    pub fn build(self) -> OrderLog {
        self.log
    }

    pub fn created(self) -> RawEvent {
        RawEvent::OrderCreated(self.log)
    }

    pub fn exchanged(self) -> RawEvent {
        RawEvent::OrderExchanged(self.log)
    }

    pub fn canceled(self) -> RawEvent {
        RawEvent::OrderCanceled(self.log)
    }
}

/// `CurrencyRegistered` event for the given mint.
pub fn currency_registered(mint: Address, decimals: u8) -> RawEvent {
    RawEvent::CurrencyRegistered(CurrencyLog {
        mint,
        decimals,
        registrar: Address::ZERO,
    })
}
