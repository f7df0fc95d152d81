//! Crossing detection logic
//!
//! Decides whether trade liquidity can reach an order: the order must sit on
//! the passive side of the trade, and a limit order's price must be at least
//! as good as the print for its side.

use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};
use types::trade::MarketTrade;
use types::Timestamp;

/// Check if a limit order on `side` accepts a trade printed at `trade_price`
///
/// A buy accepts prints at or below its limit; a sell accepts prints at or
/// above its limit.
pub fn limit_crosses(side: Side, limit_price: Price, trade_price: Price) -> bool {
    match side {
        Side::Buy => limit_price >= trade_price,
        Side::Sell => limit_price <= trade_price,
    }
}

/// Check if a trade with `aggressor` can fill an order on `order_side`
pub fn on_passive_side(aggressor: Side, order_side: Side) -> bool {
    aggressor.opposite() == order_side
}

/// Full eligibility check of an order against a print
pub fn order_can_fill(order: &Order, aggressor: Side, trade_price: Price) -> bool {
    on_passive_side(aggressor, order.side)
        && match order.order_type {
            OrderType::Market => true,
            OrderType::Limit => limit_crosses(order.side, order.price, trade_price),
        }
}

/// Unconsumed liquidity of the latest trade on an instrument
///
/// Only usable by orders going live at exactly `effective_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResidual {
    pub effective_time: Timestamp,
    pub price: Price,
    pub aggressor_side: Side,
    pub remaining: Quantity,
}

impl TradeResidual {
    pub fn new(trade: &MarketTrade, effective_time: Timestamp, remaining: Quantity) -> Self {
        Self {
            effective_time,
            price: trade.price,
            aggressor_side: trade.aggressor_side,
            remaining,
        }
    }

    /// Whether `order`, going live at `now`, may take from this residual
    pub fn available_to(&self, order: &Order, now: Timestamp) -> bool {
        self.effective_time == now
            && self.remaining.is_positive()
            && order_can_fill(order, self.aggressor_side, self.price)
    }
}
