//! Action queue
//!
//! Strategy commands wait here, already stamped with their effective time,
//! until the dispatcher applies them. Ordered by effective time, then by
//! submission sequence.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::Timestamp;

/// What a strategy command asks the book to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Send,
    Cancel,
    Modify { price: Price, quantity: Quantity },
}

/// A delayed strategy command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub order_id: OrderId,
    /// Simulated time at which the strategy issued the command
    pub submitted_at: Timestamp,
    /// Simulated time at which the command takes effect
    pub effective_time: Timestamp,
    /// Submission order across all commands
    pub sequence: u64,
}

impl Action {
    fn key(&self) -> (Timestamp, u64) {
        (self.effective_time, self.sequence)
    }
}

impl Eq for Action {}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Pending actions, earliest effective time first
#[derive(Debug, Default)]
pub struct ActionQueue {
    heap: BinaryHeap<Reverse<Action>>,
    next_sequence: u64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a command; returns its submission sequence
    pub fn push(
        &mut self,
        kind: ActionKind,
        order_id: OrderId,
        submitted_at: Timestamp,
        effective_time: Timestamp,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Reverse(Action {
            kind,
            order_id,
            submitted_at,
            effective_time,
            sequence,
        }));
        sequence
    }

    pub fn pop(&mut self) -> Option<Action> {
        self.heap.pop().map(|Reverse(action)| action)
    }

    /// Effective time of the next action
    pub fn peek_time(&self) -> Option<Timestamp> {
        self.heap.peek().map(|Reverse(action)| action.effective_time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_effective_time() {
        let mut queue = ActionQueue::new();
        queue.push(ActionKind::Send, OrderId::new(1), 0, 10);
        queue.push(ActionKind::Send, OrderId::new(2), 0, 5);

        assert_eq!(queue.peek_time(), Some(5));
        assert_eq!(queue.pop().unwrap().order_id, OrderId::new(2));
        assert_eq!(queue.pop().unwrap().order_id, OrderId::new(1));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_ties_keep_submission_order() {
        let mut queue = ActionQueue::new();
        queue.push(ActionKind::Send, OrderId::new(1), 0, 3);
        queue.push(ActionKind::Cancel, OrderId::new(1), 0, 3);
        queue.push(ActionKind::Send, OrderId::new(2), 0, 3);

        let kinds: Vec<(u64, ActionKind)> = std::iter::from_fn(|| queue.pop())
            .map(|a| (a.order_id.as_u64(), a.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (1, ActionKind::Send),
                (1, ActionKind::Cancel),
                (2, ActionKind::Send),
            ]
        );
    }

    #[test]
    fn test_sequence_numbers_are_monotonic() {
        let mut queue = ActionQueue::new();
        assert_eq!(queue.push(ActionKind::Send, OrderId::new(1), 0, 9), 0);
        assert_eq!(queue.push(ActionKind::Cancel, OrderId::new(1), 1, 2), 1);
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());
    }
}
