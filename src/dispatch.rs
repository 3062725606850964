//! Delivery of translated orders to the consumer.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::types::{EventKind, Order, SlotContext};

/// Consumer callback.
///
/// Invoked with the kind of the update, translated order or `None` if the
/// order could not be translated, and the position of the source event.
pub type EventHandler = Arc<dyn Fn(EventKind, Option<&Order>, SlotContext) + Send + Sync>;

/// Order update in owned form, as delivered by [`OrderReceiver`].
#[derive(Clone, Debug, PartialEq)]
pub struct OrderUpdate {
    pub kind: EventKind,

    /// `None` if the order referenced a currency unknown at translation time.
    pub order: Option<Order>,

    pub context: SlotContext,
}

/// Receiver of order updates.
pub struct OrderReceiver {
    inner: mpsc::UnboundedReceiver<OrderUpdate>,
}

impl OrderReceiver {
    /// Receives the next update, or `None` if the handler was replaced or
    /// the feed shut down.
    pub async fn recv(&mut self) -> Option<OrderUpdate> {
        self.inner.recv().await
    }

    /// Receives the next update if one is immediately available.
    pub fn try_recv(&mut self) -> Option<OrderUpdate> {
        self.inner.try_recv().ok()
    }
}

/// Holds a single consumer callback.
///
/// Setting a handler replaces the previous one, there is no fan-out.
#[derive(Default)]
pub struct Dispatcher {
    handler: RwLock<Option<EventHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the callback, returns `true` if another one was replaced.
    pub fn set_handler<F>(&self, handler: F) -> bool
    where
        F: Fn(EventKind, Option<&Order>, SlotContext) + Send + Sync + 'static,
    {
        self.handler.write().replace(Arc::new(handler)).is_some()
    }

    pub fn clear_handler(&self) {
        self.handler.write().take();
    }

    pub fn has_handler(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Installs a callback forwarding updates into a channel.
    pub fn channel(&self) -> OrderReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.set_handler(move |kind, order, context| {
            // Receiver dropped, updates are discarded until the handler is replaced
            _ = tx.send(OrderUpdate {
                kind,
                order: order.cloned(),
                context,
            });
        });
        OrderReceiver { inner: rx }
    }

    /// Invokes the current callback, if any.
    pub fn emit(&self, kind: EventKind, order: Option<&Order>, context: SlotContext) {
        // Clone out of the lock, so the callback is free to replace itself
        let handler = self.handler.read().clone();
        if let Some(handler) = handler {
            handler(kind, order, context);
        }
    }
}
