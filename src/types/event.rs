use std::fmt;

use alloy::primitives::Address;

use super::{Slot, SlotContext};

/// Category of raw events the market program emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    OrderCreated,
    OrderExchanged,
    OrderCanceled,
    CurrencyRegistered,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::OrderCreated,
        EventCategory::OrderExchanged,
        EventCategory::OrderCanceled,
        EventCategory::CurrencyRegistered,
    ];

    /// Event name as declared by the program.
    pub fn name(&self) -> &'static str {
        match self {
            EventCategory::OrderCreated => "OrderCreated",
            EventCategory::OrderExchanged => "OrderExchanged",
            EventCategory::OrderCanceled => "OrderCanceled",
            EventCategory::CurrencyRegistered => "CurrencyRegistered",
        }
    }

    /// Kind of the update delivered to the consumer, `None` for categories
    /// consumed internally.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            EventCategory::OrderCreated => Some(EventKind::OrderAdded),
            EventCategory::OrderExchanged => Some(EventKind::OrderModified),
            EventCategory::OrderCanceled => Some(EventKind::OrderRemoved),
            EventCategory::CurrencyRegistered => None,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Kind of the order update delivered to the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    OrderAdded,
    OrderModified,
    OrderRemoved,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::OrderAdded => "orderAdded",
            EventKind::OrderModified => "orderModified",
            EventKind::OrderRemoved => "orderRemoved",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Order lifecycle event fields, with raw fixed-point price and
/// raw side discriminant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLog {
    pub order_id: u64,
    pub side: u8,
    pub asset_mint: Address,
    pub currency_mint: Address,
    pub price: u64,
    pub quantity_remaining: u64,
    pub origination_quantity: u64,
    pub owner: Address,
    pub owner_asset_account: Address,
    pub owner_currency_account: Address,
    pub created_at: i64,
}

/// Currency registration event fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrencyLog {
    pub mint: Address,
    pub decimals: u8,
    pub registrar: Address,
}

/// Raw event decoded from the program log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawEvent {
    OrderCreated(OrderLog),
    OrderExchanged(OrderLog),
    OrderCanceled(OrderLog),
    CurrencyRegistered(CurrencyLog),
}

impl RawEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            RawEvent::OrderCreated(_) => EventCategory::OrderCreated,
            RawEvent::OrderExchanged(_) => EventCategory::OrderExchanged,
            RawEvent::OrderCanceled(_) => EventCategory::OrderCanceled,
            RawEvent::CurrencyRegistered(_) => EventCategory::CurrencyRegistered,
        }
    }

    /// Order fields, if this is an order lifecycle event.
    pub fn order(&self) -> Option<&OrderLog> {
        match self {
            RawEvent::OrderCreated(o) | RawEvent::OrderExchanged(o) | RawEvent::OrderCanceled(o) => {
                Some(o)
            }
            RawEvent::CurrencyRegistered(_) => None,
        }
    }
}

/// Event along with its position in chain history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext<T> {
    pub(crate) context: SlotContext,
    pub(crate) event: T,
}

impl<T> EventContext<T> {
    pub fn new(context: SlotContext, event: T) -> Self {
        Self { context, event }
    }

    pub fn context(&self) -> SlotContext {
        self.context
    }

    pub fn slot(&self) -> Slot {
        self.context.slot()
    }

    pub fn event(&self) -> &T {
        &self.event
    }

    pub fn into_event(self) -> T {
        self.event
    }
}

/// Events from a specific block.
#[derive(Debug)]
pub struct BlockEvents<T> {
    slot: Slot,
    events: Vec<T>,
}

impl<T> BlockEvents<T> {
    pub(crate) fn new(slot: Slot, events: Vec<T>) -> Self {
        Self { slot, events }
    }

    /// Slot the events were produced at.
    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn events(&self) -> &[T] {
        &self.events
    }

    pub fn into_events(self) -> Vec<T> {
        self.events
    }
}
