//! Lazy merge of validated batches into one time-ordered stream
//!
//! Each batch is consumed through its own cursor; a min-heap holds the head of
//! every non-exhausted batch keyed by `(timestamp, batch index)`. Because only
//! one head per batch is ever in the heap, within-batch order is preserved
//! without an explicit sequence number, and equal timestamps across batches
//! resolve by insertion order.
//!
//! The timeline is finite and single-pass. A fresh run commits the ingester
//! again.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::vec::IntoIter;

use types::Timestamp;

use crate::events::MarketEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct HeadKey {
    timestamp: Timestamp,
    batch: usize,
}

/// Ascending-timestamp sequence over all committed batches
#[derive(Debug)]
pub struct EventTimeline {
    cursors: Vec<IntoIter<MarketEvent>>,
    heads: Vec<Option<MarketEvent>>,
    heap: BinaryHeap<Reverse<HeadKey>>,
    remaining: usize,
}

impl EventTimeline {
    /// Build from batches that are each already time-ordered
    pub fn new(batches: Vec<Vec<MarketEvent>>) -> Self {
        let remaining = batches.iter().map(Vec::len).sum();
        let mut cursors = Vec::with_capacity(batches.len());
        let mut heads = Vec::with_capacity(batches.len());
        let mut heap = BinaryHeap::with_capacity(batches.len());

        for (batch, events) in batches.into_iter().enumerate() {
            let mut cursor = events.into_iter();
            let head = cursor.next();
            if let Some(event) = &head {
                heap.push(Reverse(HeadKey {
                    timestamp: event.timestamp(),
                    batch,
                }));
            }
            cursors.push(cursor);
            heads.push(head);
        }

        Self {
            cursors,
            heads,
            heap,
            remaining,
        }
    }

    /// A timeline with no events
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Next event without consuming it
    pub fn peek(&self) -> Option<&MarketEvent> {
        let Reverse(key) = self.heap.peek()?;
        self.heads[key.batch].as_ref()
    }

    /// Timestamp of the next event
    pub fn peek_timestamp(&self) -> Option<Timestamp> {
        self.heap.peek().map(|Reverse(key)| key.timestamp)
    }

    /// Events not yet consumed
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Iterator for EventTimeline {
    type Item = MarketEvent;

    fn next(&mut self) -> Option<MarketEvent> {
        let Reverse(key) = self.heap.pop()?;
        let event = self.heads[key.batch].take();

        if let Some(following) = self.cursors[key.batch].next() {
            self.heap.push(Reverse(HeadKey {
                timestamp: following.timestamp(),
                batch: key.batch,
            }));
            self.heads[key.batch] = Some(following);
        }

        if event.is_some() {
            self.remaining -= 1;
        }
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
