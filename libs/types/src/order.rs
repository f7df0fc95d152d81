//! Order lifecycle types
//!
//! An order is created by a strategy command in `PendingNew`, becomes `New`
//! when its Send action takes effect in the book, and only ever moves forward:
//!
//! ```text
//! PendingNew → New → { PartiallyFilled → Filled | Filled | Canceled }
//! ```
//!
//! `Filled` and `Canceled` are terminal. A modify re-enters `New` (or stays
//! `PartiallyFilled` when the order already has fills) without touching the
//! creation timestamp.

use crate::errors::TransitionError;
use crate::ids::{InstrumentId, OrderId};
use crate::numeric::{Price, Quantity};
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Fills at whatever the next eligible trade prints
    Market,
    /// Fills only against trades at or better than the limit price
    Limit,
}

/// Order state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Submitted by the strategy, execution latency not yet elapsed
    PendingNew,
    /// Live in the book without fills
    New,
    /// Live in the book with some fills
    PartiallyFilled,
    /// Completely filled (terminal)
    Filled,
    /// Canceled (terminal)
    Canceled,
}

impl OrderState {
    /// Check if state is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Canceled)
    }

    /// Check if the order is resting in the book
    pub fn is_live(&self) -> bool {
        matches!(self, OrderState::New | OrderState::PartiallyFilled)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderState::PendingNew => "PENDING_NEW",
            OrderState::New => "NEW",
            OrderState::PartiallyFilled => "PARTIALLY_FILLED",
            OrderState::Filled => "FILLED",
            OrderState::Canceled => "CANCELED",
        };
        f.write_str(label)
    }
}

/// Complete order structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub instrument: InstrumentId,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub state: OrderState,
    pub filled_quantity: Quantity,
    pub last_exec_price: Price,
    /// Simulated time at which the strategy issued the Send
    pub submitted_at: Timestamp,
    /// Simulated time at which the order went live; set exactly once
    pub create_timestamp: Option<Timestamp>,
    pub last_report_timestamp: Timestamp,
}

impl Order {
    /// Create a new order awaiting its trip to the book
    pub fn new(
        id: OrderId,
        instrument: InstrumentId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id,
            instrument,
            side,
            order_type,
            price,
            quantity,
            state: OrderState::PendingNew,
            filled_quantity: Quantity::zero(),
            last_exec_price: Price::zero(),
            submitted_at,
            create_timestamp: None,
            last_report_timestamp: submitted_at,
        }
    }

    /// Quantity still open
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    /// Check quantity invariant: filled never exceeds total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity <= self.quantity
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Send took effect: the order is live from `timestamp`
    pub fn accept(&mut self, timestamp: Timestamp) -> Result<(), TransitionError> {
        if self.state != OrderState::PendingNew {
            return Err(self.transition_error(OrderState::New));
        }
        self.state = OrderState::New;
        self.create_timestamp = Some(timestamp);
        self.last_report_timestamp = timestamp;
        Ok(())
    }

    /// Record an execution of `quantity` at `price`
    pub fn apply_fill(
        &mut self,
        quantity: Quantity,
        price: Price,
        timestamp: Timestamp,
    ) -> Result<(), TransitionError> {
        if !self.state.is_live() || quantity > self.remaining_quantity() || !quantity.is_positive() {
            return Err(self.transition_error(OrderState::Filled));
        }

        self.filled_quantity += quantity;
        self.last_exec_price = price;
        self.last_report_timestamp = timestamp;
        self.state = if self.is_filled() {
            OrderState::Filled
        } else {
            OrderState::PartiallyFilled
        };
        Ok(())
    }

    /// Cancel a live order
    pub fn cancel(&mut self, timestamp: Timestamp) -> Result<(), TransitionError> {
        if !self.state.is_live() {
            return Err(self.transition_error(OrderState::Canceled));
        }
        self.state = OrderState::Canceled;
        self.last_report_timestamp = timestamp;
        Ok(())
    }

    /// Replace price and quantity of a live order, keeping its time priority
    pub fn modify(
        &mut self,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Result<(), TransitionError> {
        let target = if self.has_fills() {
            OrderState::PartiallyFilled
        } else {
            OrderState::New
        };
        if !self.state.is_live() || quantity <= self.filled_quantity {
            return Err(self.transition_error(target));
        }
        self.price = price;
        self.quantity = quantity;
        self.state = target;
        self.last_report_timestamp = timestamp;
        Ok(())
    }

    /// Read-only projection used by `GetFilledOrders()`
    pub fn filled_report(&self) -> Option<FilledOrderReport> {
        if self.state != OrderState::Filled {
            return None;
        }
        Some(FilledOrderReport {
            order_id: self.id,
            instrument: self.instrument.clone(),
            nominal_price: self.price,
            exec_price: self.last_exec_price,
            quantity: self.quantity,
            filled_quantity: self.filled_quantity,
            create_timestamp: self.create_timestamp.unwrap_or(self.submitted_at),
            last_report_timestamp: self.last_report_timestamp,
            side: self.side,
        })
    }

    fn transition_error(&self, to: OrderState) -> TransitionError {
        TransitionError {
            order_id: self.id,
            from: self.state,
            to,
        }
    }
}

/// A filled order as reported back to the strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledOrderReport {
    #[serde(skip_serializing, default = "default_order_id")]
    pub order_id: OrderId,
    pub instrument: InstrumentId,
    pub nominal_price: Price,
    pub exec_price: Price,
    #[serde(rename = "qty")]
    pub quantity: Quantity,
    #[serde(rename = "filled_qty")]
    pub filled_quantity: Quantity,
    pub create_timestamp: Timestamp,
    pub last_report_timestamp: Timestamp,
    pub side: Side,
}

fn default_order_id() -> OrderId {
    OrderId::new(0)
}
