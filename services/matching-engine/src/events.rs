//! Event structures for the matching engine
//!
//! Every state change the book performs is reported as an `ExecutionEvent`
//! carrying a snapshot of the order after the change. The simulation turns
//! these into strategy callbacks and journal entries, in emission order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{InstrumentId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::Timestamp;

/// What supplied the liquidity for a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillSource {
    /// A market trade reached a resting order
    RestingOrder,
    /// A new order went live against same-instant trade liquidity
    CrossingOnEntry,
}

/// One allocation of trade quantity to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Monotonic fill number within a run
    pub sequence: u64,
    pub order_id: OrderId,
    pub instrument: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Timestamp,
    pub source: FillSource,
}

impl Fill {
    /// Price times quantity
    pub fn notional(&self) -> Decimal {
        self.price.as_decimal() * self.quantity.as_decimal()
    }
}

/// Reason an action was dropped without effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IgnoreReason {
    /// Target already `Filled` or `Canceled`
    TerminalOrder,
    /// Modify would leave the order at or below what already executed
    QuantityBelowFilled,
}

/// A state change performed by the book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Send took effect; the order is live
    Accepted { order: Order },
    /// Quantity executed against trade liquidity
    Filled { fill: Fill, order: Order },
    /// Cancel took effect
    Canceled { order: Order },
    /// Modify took effect
    Modified { order: Order },
    /// Cancel or modify arrived too late to matter
    Ignored { order_id: OrderId, reason: IgnoreReason },
}

impl ExecutionEvent {
    /// Id of the order the event concerns
    pub fn order_id(&self) -> OrderId {
        match self {
            ExecutionEvent::Accepted { order }
            | ExecutionEvent::Filled { order, .. }
            | ExecutionEvent::Canceled { order }
            | ExecutionEvent::Modified { order } => order.id,
            ExecutionEvent::Ignored { order_id, .. } => *order_id,
        }
    }
}
