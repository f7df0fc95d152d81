//! Ask (sell-side) order book
//!
//! Resting sell orders of one instrument, lowest limit price first, with
//! market sells ahead of every level. Uses BTreeMap for deterministic
//! iteration order.

use std::collections::BTreeMap;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};

use super::price_level::{Allocation, PriceLevel, QueuePriority};
use crate::matching::crossing;

/// Ask (sell) side order book
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    market: PriceLevel,
    /// Limit levels sorted ascending (lowest price first)
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
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
                if level.is_empty() {
                    self.levels.remove(&order.price);
                }
                removed
            }
        }
    }

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

    /// Allocate a buy-aggressor trade across eligible asks.
    ///
    /// Eligible asks are market orders and limits at or below `trade_price`.
    pub fn allocate(&mut self, trade_price: Price, available: Quantity) -> (Vec<Allocation>, Quantity) {
        let mut allocations = Vec::new();
        let mut left = self.market.allocate(available, &mut allocations);
        let mut emptied = Vec::new();

        for (price, level) in self.levels.iter_mut() {
            if !left.is_positive() || !crossing::limit_crosses(Side::Sell, *price, trade_price) {
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

    /// Get the best ask (lowest limit price)
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

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
