//! Event transport collaborator.
//!
//! [`EventTransport`] delivers raw market events to handlers subscribed per
//! [`EventCategory`]. Handlers return futures, the transport awaits each of
//! them before delivering the next event, so the delivery order is preserved.
//!
//! [`LogTransport`] implements it over [`crate::stream::raw`] log polling.

use std::{
    fmt,
    future::Future,
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use alloy::providers::Provider;
use dashmap::DashMap;
use futures::{StreamExt, future::BoxFuture};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    Market,
    error::FeedError,
    stream::{self, RawEventContext},
    types::{EventCategory, Slot},
};

/// Handler of raw events of a single category.
pub type RawEventHandler = Arc<dyn Fn(RawEventContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifier of a handler subscription, unique per transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Push-based source of raw market events.
pub trait EventTransport: Send + Sync + 'static {
    /// Establishes the connection and validates that the market program
    /// is reachable and matches the expected event layout.
    fn connect(&self) -> impl Future<Output = Result<(), FeedError>> + Send;

    /// Registers handler for the events of the given category.
    fn subscribe(
        &self,
        category: EventCategory,
        handler: RawEventHandler,
    ) -> Result<SubscriptionId, FeedError>;

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError>;

    /// Starts delivering events to subscribed handlers.
    fn listen(&self) -> Result<(), FeedError>;

    /// Stops delivery and releases the connection.
    fn disconnect(&self);
}

/// Subscribed handlers, keyed by event category.
#[derive(Default)]
pub(crate) struct Routes {
    next_id: AtomicU64,
    handlers: DashMap<EventCategory, Vec<(SubscriptionId, RawEventHandler)>>,
}

impl Routes {
    pub(crate) fn subscribe(&self, category: EventCategory, handler: RawEventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.entry(category).or_default().push((id, handler));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError> {
        for mut entry in self.handlers.iter_mut() {
            if let Some(pos) = entry.iter().position(|(sid, _)| *sid == id) {
                entry.remove(pos);
                return Ok(());
            }
        }
        Err(FeedError::UnknownSubscription(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.iter().map(|e| e.len()).sum()
    }

    pub(crate) fn clear(&self) {
        self.handlers.clear();
    }

    /// Passes the event to every handler of its category, one after another.
    pub(crate) async fn deliver(&self, event: RawEventContext) {
        let category = event.event().category();
        // Handlers are cloned out, so they are free to (un)subscribe
        let handlers: Vec<RawEventHandler> = self
            .handlers
            .get(&category)
            .map(|e| e.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        if handlers.is_empty() {
            debug!(%category, slot = event.slot(), "No handler subscribed, event skipped");
        }
        for handler in handlers {
            handler(event.clone()).await;
        }
    }
}

/// [`EventTransport`] polling market program logs block by block.
pub struct LogTransport<P> {
    market: Market,
    provider: P,
    from: Option<Slot>,
    start: Mutex<Option<Slot>>,
    routes: Arc<Routes>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: Provider + Clone + 'static> LogTransport<P> {
    /// Creates transport which starts from the block following the chain
    /// head at the moment of [`EventTransport::connect`].
    pub fn new(market: &Market, provider: P) -> Self {
        Self {
            market: market.clone(),
            provider,
            from: None,
            start: Mutex::new(None),
            routes: Arc::new(Routes::default()),
            task: Mutex::new(None),
        }
    }

    /// Sets the block to start delivering events from.
    pub fn from_slot(mut self, slot: Slot) -> Self {
        self.from = Some(slot);
        self
    }

    /// Whether the polling task is running.
    pub fn is_listening(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl<P: Provider + Clone + Send + Sync + 'static> EventTransport for LogTransport<P> {
    async fn connect(&self) -> Result<(), FeedError> {
        let chain_id = self.provider.get_chain_id().await?;
        if chain_id != self.market.chain_id() {
            return Err(FeedError::ChainMismatch(self.market.chain_id(), chain_id));
        }

        let code = self.provider.get_code_at(self.market.address()).await?;
        if code.is_empty() {
            return Err(FeedError::SchemaUnavailable(self.market.address()));
        }

        let start = match self.from {
            Some(from) => from,
            None => self.provider.get_block_number().await? + 1,
        }
        .max(self.market.deployed_at_block());
        *self.start.lock() = Some(start);

        info!(chain_id, market = %self.market.address(), start, "Transport connected");
        Ok(())
    }

    fn subscribe(
        &self,
        category: EventCategory,
        handler: RawEventHandler,
    ) -> Result<SubscriptionId, FeedError> {
        Ok(self.routes.subscribe(category, handler))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError> {
        self.routes.unsubscribe(id)
    }

    fn listen(&self) -> Result<(), FeedError> {
        let start = (*self.start.lock()).ok_or(FeedError::NotConnected)?;
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }

        let routes = self.routes.clone();
        let provider = self.provider.clone();
        let poll_interval = provider.client().poll_interval();
        let events = stream::raw(&self.market, provider, start, tokio::time::sleep);

        *task = Some(tokio::spawn(async move {
            let mut events = pin!(events);
            while let Some(result) = events.next().await {
                match result {
                    Ok(block) => {
                        for event in block.into_events() {
                            routes.deliver(event).await;
                        }
                    }
                    Err(e) => {
                        warn!(?e, "Failed to fetch market events, retrying");
                        tokio::time::sleep(poll_interval).await;
                    }
                }
            }
        }));
        info!(start, "Listening for market events");
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        self.routes.clear();
        self.start.lock().take();
        info!(market = %self.market.address(), "Transport disconnected");
    }
}
