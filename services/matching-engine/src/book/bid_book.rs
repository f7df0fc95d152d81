//! Bid (buy-side) order book
//!
//! Resting buy orders of one instrument. Market orders sit ahead of every
//! price level; limit levels are walked highest price first. Uses BTreeMap
//! for deterministic iteration order.

use std::collections::BTreeMap;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};

use super::price_level::{Allocation, PriceLevel, QueuePriority};
use crate::matching::crossing;

/// Bid (buy) side order book
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    /// Resting market buys, ahead of all priced levels
    market: PriceLevel,
    /// Limit levels (BTreeMap iterates ascending; best bid is last)
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest an order with the given time priority
    pub fn insert(&mut self, order: &Order, priority: QueuePriority) {
        let quantity = order.remaining_quantity();
        match order.order_type {
            OrderType::Market => self.market.insert(order.id, priority, quantity),
            OrderType::Limit => self
                .levels
                .entry(order.price)
                .or_default()
                .insert(order.id, priority, quantity),
        }
    }

    /// Remove an order, returning its priority and open quantity
    pub fn remove(&mut self, order: &Order) -> Option<(QueuePriority, Quantity)> {
        match order.order_type {
            OrderType::Market => self.market.remove(&order.id),
            OrderType::Limit => {
                let level = self.levels.get_mut(&order.price)?;
                let removed = level.remove(&order.id);
                // Remove empty price levels to keep book clean
                if level.is_empty() {
                    self.levels.remove(&order.price);
                }
                removed
            }
        }
    }

    /// Replace the open quantity of a resting order in place
    pub fn update_quantity(&mut self, order: &Order, quantity: Quantity) -> bool {
        match order.order_type {
            OrderType::Market => self.market.update_quantity(&order.id, quantity),
            OrderType::Limit => self
                .levels
                .get_mut(&order.price)
                .map(|level| level.update_quantity(&order.id, quantity))
                .unwrap_or(false),
        }
    }

    /// Allocate a sell-aggressor trade across eligible bids.
    ///
    /// Eligible bids are market orders and limits at or above `trade_price`.
    /// Returns the allocations in priority order and the unconsumed quantity.
    pub fn allocate(&mut self, trade_price: Price, available: Quantity) -> (Vec<Allocation>, Quantity) {
        let mut allocations = Vec::new();
        let mut left = self.market.allocate(available, &mut allocations);
        let mut emptied = Vec::new();

        for (price, level) in self.levels.iter_mut().rev() {
            if !left.is_positive() || !crossing::limit_crosses(Side::Buy, *price, trade_price) {
                break;
            }
            left = level.allocate(left, &mut allocations);
            if level.is_empty() {
                emptied.push(*price);
            }
        }

        for price in emptied {
            self.levels.remove(&price);
        }
        (allocations, left)
    }

    /// Get the best bid (highest limit price) with its open quantity
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Get depth snapshot (top N limit levels)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Open quantity of resting market orders
    pub fn market_quantity(&self) -> Quantity {
        self.market.total_quantity()
    }

    pub fn is_empty(&self) -> bool {
        self.market.is_empty() && self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn order_count(&self) -> usize {
        self.market.order_count() + self.levels.values().map(PriceLevel::order_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{InstrumentId, OrderId};

    fn create_test_order(id: u64, order_type: OrderType, price: u64, qty: &str) -> Order {
        Order::new(
            OrderId::new(id),
            InstrumentId::new("BTCUSDT"),
            Side::Buy,
            order_type,
            Price::from_u64(price),
            qty.parse().unwrap(),
            0,
        )
    }

    fn prio(sequence: u64) -> QueuePriority {
        QueuePriority { created_at: 0, sequence }
    }

    #[test]
    fn test_bid_book_best_bid() {
        let mut book = BidBook::new();
        book.insert(&create_test_order(1, OrderType::Limit, 50000, "1.0"), prio(1));
        book.insert(&create_test_order(2, OrderType::Limit, 51000, "2.0"), prio(2));
        book.insert(&create_test_order(3, OrderType::Limit, 49000, "1.5"), prio(3));

        let (best_price, best_qty) = book.best_bid().unwrap();
        assert_eq!(best_price, Price::from_u64(51000));
        assert_eq!(best_qty, "2.0".parse().unwrap());
        assert_eq!(book.level_count(), 3);
    }

    #[test]
    fn test_bid_book_remove() {
        let mut book = BidBook::new();
        let order = create_test_order(1, OrderType::Limit, 50000, "1.0");
        book.insert(&order, prio(1));

        assert!(book.remove(&order).is_some());
        assert!(book.is_empty());
        assert!(book.remove(&order).is_none());
    }

    #[test]
    fn test_market_bids_fill_before_limits() {
        let mut book = BidBook::new();
        book.insert(&create_test_order(1, OrderType::Limit, 101, "1"), prio(1));
        book.insert(&create_test_order(2, OrderType::Market, 0, "1"), prio(2));

        let (allocations, left) = book.allocate(Price::from_u64(100), "1".parse().unwrap());
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].order_id, OrderId::new(2));
        assert!(left.is_zero());
    }

    #[test]
    fn test_allocation_stops_at_trade_price() {
        let mut book = BidBook::new();
        book.insert(&create_test_order(1, OrderType::Limit, 99, "1"), prio(1));
        book.insert(&create_test_order(2, OrderType::Limit, 100, "1"), prio(2));
        book.insert(&create_test_order(3, OrderType::Limit, 102, "1"), prio(3));

        let (allocations, left) = book.allocate(Price::from_u64(100), "5".parse().unwrap());
        let ids: Vec<u64> = allocations.iter().map(|a| a.order_id.as_u64()).collect();
        // Best price first; the 99 bid is below the print
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(left, "3".parse().unwrap());
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.best_bid().map(|(p, _)| p), Some(Price::from_u64(99)));
    }

    #[test]
    fn test_bid_book_depth_snapshot() {
        let mut book = BidBook::new();
        book.insert(&create_test_order(1, OrderType::Limit, 50000, "1.0"), prio(1));
        book.insert(&create_test_order(2, OrderType::Limit, 51000, "2.0"), prio(2));
        book.insert(&create_test_order(3, OrderType::Limit, 52000, "0.5"), prio(3));

        let depth = book.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(52000));
        assert_eq!(depth[1].0, Price::from_u64(51000));
    }
}
