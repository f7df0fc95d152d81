//! Price level implementation with a priority-ordered queue
//!
//! A price level contains all resting orders at one price point (or all
//! resting market orders of a side). Orders are kept sorted by
//! `QueuePriority`, i.e. by creation time and then by acceptance sequence.
//! Because orders normally go live in time order, inserts almost always land
//! at the back; a modify that moves an order to another price re-inserts it
//! at the position its original priority earns.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::Timestamp;

/// Time priority of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueuePriority {
    /// Simulated time at which the order went live
    pub created_at: Timestamp,
    /// Acceptance order among orders created at the same time
    pub sequence: u64,
}

/// Quantity assigned to one order out of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub order_id: OrderId,
    pub quantity: Quantity,
}

/// Orders resting at a single price
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Queue of orders in priority order
    orders: VecDeque<OrderEntry>,
    /// Total open quantity at this level
    total_quantity: Quantity,
}

#[derive(Debug, Clone)]
struct OrderEntry {
    order_id: OrderId,
    priority: QueuePriority,
    remaining_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order at the position its priority earns
    pub fn insert(&mut self, order_id: OrderId, priority: QueuePriority, quantity: Quantity) {
        let entry = OrderEntry {
            order_id,
            priority,
            remaining_quantity: quantity,
        };

        match self.orders.back() {
            Some(back) if back.priority > priority => {
                let position = self.orders.partition_point(|e| e.priority < priority);
                self.orders.insert(position, entry);
            }
            _ => self.orders.push_back(entry),
        }
        self.total_quantity += quantity;
    }

    /// Remove an order, returning its priority and open quantity
    pub fn remove(&mut self, order_id: &OrderId) -> Option<(QueuePriority, Quantity)> {
        let position = self.orders.iter().position(|entry| &entry.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.remaining_quantity);
        Some((entry.priority, entry.remaining_quantity))
    }

    /// Replace the open quantity of an order in place, keeping its position
    pub fn update_quantity(&mut self, order_id: &OrderId, quantity: Quantity) -> bool {
        match self.orders.iter_mut().find(|entry| &entry.order_id == order_id) {
            Some(entry) => {
                self.total_quantity = self.total_quantity.saturating_sub(entry.remaining_quantity) + quantity;
                entry.remaining_quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Consume up to `available` from the front of the queue.
    ///
    /// Fully filled orders leave the level. Returns the quantity left over.
    pub fn allocate(&mut self, mut available: Quantity, allocations: &mut Vec<Allocation>) -> Quantity {
        while available.is_positive() {
            let Some(front) = self.orders.front_mut() else {
                break;
            };

            let take = front.remaining_quantity.min(available);
            allocations.push(Allocation {
                order_id: front.order_id,
                quantity: take,
            });

            front.remaining_quantity = front.remaining_quantity.saturating_sub(take);
            self.total_quantity = self.total_quantity.saturating_sub(take);
            available = available.saturating_sub(take);

            if front.remaining_quantity.is_zero() {
                self.orders.pop_front();
            }
        }
        available
    }

    /// Peek at the front order: (order_id, open quantity)
    pub fn peek_front(&self) -> Option<(OrderId, Quantity)> {
        self.orders
            .front()
            .map(|entry| (entry.order_id, entry.remaining_quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Order ids in priority order
    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.orders.iter().map(|entry| entry.order_id)
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn prio(created_at: Timestamp, sequence: u64) -> QueuePriority {
        QueuePriority { created_at, sequence }
    }

    #[test]
    fn test_price_level_insert() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(1), prio(1, 1), qty("1.5"));

        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), qty("1.5"));
        assert!(!level.is_empty());
    }

    #[test]
    fn test_price_level_fifo_order() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(1), prio(1, 1), qty("1.0"));
        level.insert(OrderId::new(2), prio(2, 2), qty("2.0"));
        level.insert(OrderId::new(3), prio(2, 3), qty("3.0"));

        let ids: Vec<OrderId> = level.order_ids().collect();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]);
    }

    #[test]
    fn test_reinsert_keeps_original_priority() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(2), prio(5, 2), qty("1"));
        level.insert(OrderId::new(3), prio(7, 3), qty("1"));
        // Order 1 moved here from another price; it is older than both
        level.insert(OrderId::new(1), prio(3, 1), qty("1"));
        // Order 4 sits between the two
        level.insert(OrderId::new(4), prio(6, 4), qty("1"));

        let ids: Vec<u64> = level.order_ids().map(|id| id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_price_level_remove() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(1), prio(1, 1), qty("1.0"));
        level.insert(OrderId::new(2), prio(1, 2), qty("2.0"));

        let removed = level.remove(&OrderId::new(1));
        assert_eq!(removed, Some((prio(1, 1), qty("1.0"))));
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), qty("2.0"));
        assert_eq!(level.remove(&OrderId::new(9)), None);
    }

    #[test]
    fn test_allocate_partial_and_full() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(1), prio(1, 1), qty("1.0"));
        level.insert(OrderId::new(2), prio(1, 2), qty("2.0"));

        let mut allocations = Vec::new();
        let left = level.allocate(qty("1.5"), &mut allocations);

        assert_eq!(left, Quantity::zero());
        assert_eq!(
            allocations,
            vec![
                Allocation { order_id: OrderId::new(1), quantity: qty("1.0") },
                Allocation { order_id: OrderId::new(2), quantity: qty("0.5") },
            ]
        );
        assert_eq!(level.peek_front(), Some((OrderId::new(2), qty("1.5"))));
        assert_eq!(level.total_quantity(), qty("1.5"));
    }

    #[test]
    fn test_allocate_returns_leftover() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(1), prio(1, 1), qty("1"));

        let mut allocations = Vec::new();
        let left = level.allocate(qty("4"), &mut allocations);
        assert_eq!(left, qty("3"));
        assert!(level.is_empty());
        assert_eq!(level.total_quantity(), Quantity::zero());
    }

    #[test]
    fn test_update_quantity_in_place() {
        let mut level = PriceLevel::new();
        level.insert(OrderId::new(1), prio(1, 1), qty("1"));
        level.insert(OrderId::new(2), prio(1, 2), qty("1"));

        assert!(level.update_quantity(&OrderId::new(1), qty("4")));
        assert_eq!(level.total_quantity(), qty("5"));
        assert_eq!(level.peek_front(), Some((OrderId::new(1), qty("4"))));
        assert!(!level.update_quantity(&OrderId::new(3), qty("4")));
    }
}
