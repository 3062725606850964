//! Bookkeeping of the feed's transport subscriptions.

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    error::FeedError,
    transport::{EventTransport, RawEventHandler, SubscriptionId},
    types::EventCategory,
};

/// Subscribes one handler per [`EventCategory`] and remembers the
/// subscriptions to release them later.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: Mutex<Vec<(EventCategory, SubscriptionId)>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes handler produced by `route` for every event category.
    ///
    /// Either all categories get subscribed, or none: subscriptions made
    /// before a failure are released.
    pub fn subscribe_all<T, R>(&self, transport: &T, route: R) -> Result<(), FeedError>
    where
        T: EventTransport,
        R: Fn(EventCategory) -> RawEventHandler,
    {
        let mut subscribed = Vec::with_capacity(EventCategory::ALL.len());
        for category in EventCategory::ALL {
            match transport.subscribe(category, route(category)) {
                Ok(id) => {
                    debug!(%category, %id, "Subscribed");
                    subscribed.push((category, id));
                }
                Err(e) => {
                    for (_, id) in subscribed {
                        _ = transport.unsubscribe(id);
                    }
                    return Err(e);
                }
            }
        }
        self.subscriptions.lock().extend(subscribed);
        Ok(())
    }

    /// Releases all subscriptions, failures are logged and skipped.
    pub fn unsubscribe_all<T: EventTransport>(&self, transport: &T) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for (category, id) in subscriptions {
            if let Err(e) = transport.unsubscribe(id) {
                warn!(%category, %id, ?e, "Failed to unsubscribe");
            }
        }
    }

    pub fn subscriptions(&self) -> Vec<(EventCategory, SubscriptionId)> {
        self.subscriptions.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }
}
