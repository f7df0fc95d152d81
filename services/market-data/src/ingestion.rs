//! Batch ingestion layer for the market-data timeline
//!
//! Collects input batches (one per instrument, feed or topic), validates that
//! each batch is itself time-ordered, and commits them into an
//! [`EventTimeline`]. Batches need not be merged across each other; that is
//! the timeline's job.
//!
//! Tie-break contract: events with equal timestamps are delivered in batch
//! insertion order, then in their original within-batch order. Re-adding a
//! batch under an existing (kind, key) replaces its content but keeps its
//! original insertion slot. Batches supplied through a map are inserted in
//! the map's key order.

use std::collections::BTreeMap;

use tracing::{debug, error, info};
use types::errors::InvalidDataError;
use types::trade::MarketTrade;
use types::update::{CustomPayload, CustomUpdate, QuoteUpdate};

use crate::events::{FeedKind, MarketEvent};
use crate::timeline::EventTimeline;

/// A named, time-ordered input batch
#[derive(Debug, Clone, PartialEq)]
pub struct FeedBatch {
    pub kind: FeedKind,
    pub key: String,
    pub events: Vec<MarketEvent>,
}

impl FeedBatch {
    /// Check that timestamps never decrease and payloads are finite
    pub fn validate(&self) -> Result<(), InvalidDataError> {
        let mut previous: Option<i64> = None;

        for (index, event) in self.events.iter().enumerate() {
            let timestamp = event.timestamp();
            if let Some(prev) = previous {
                if timestamp < prev {
                    return Err(InvalidDataError::NonMonotonic {
                        batch: self.key.clone(),
                        index,
                        previous: prev,
                        timestamp,
                    });
                }
            }
            previous = Some(timestamp);

            if let MarketEvent::Custom(update) = event {
                if !payload_is_finite(&update.payload) {
                    return Err(InvalidDataError::NonFinite {
                        batch: self.key.clone(),
                        index,
                        field: "payload".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn payload_is_finite(payload: &CustomPayload) -> bool {
    match payload {
        CustomPayload::Value(v) => v.is_finite(),
        CustomPayload::Fields(fields) => fields.values().all(|v| v.is_finite()),
    }
}

/// Collects batches before a run
#[derive(Debug, Default)]
pub struct FeedIngester {
    batches: Vec<FeedBatch>,
}

impl FeedIngester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a batch of trades
    pub fn add_trades(&mut self, key: impl Into<String>, trades: Vec<MarketTrade>) {
        let events = trades.into_iter().map(MarketEvent::Trade).collect();
        self.insert(FeedKind::Trades, key.into(), events);
    }

    /// Add (or replace) a batch of custom updates
    pub fn add_custom_updates(&mut self, key: impl Into<String>, updates: Vec<CustomUpdate>) {
        let events = updates.into_iter().map(MarketEvent::Custom).collect();
        self.insert(FeedKind::Custom, key.into(), events);
    }

    /// Add (or replace) a batch of quote updates
    pub fn add_quotes(&mut self, key: impl Into<String>, quotes: Vec<QuoteUpdate>) {
        let events = quotes.into_iter().map(MarketEvent::Quote).collect();
        self.insert(FeedKind::Quotes, key.into(), events);
    }

    /// Add every trade batch of a map, in key order
    pub fn add_trade_map(&mut self, trades: BTreeMap<String, Vec<MarketTrade>>) {
        for (key, batch) in trades {
            self.add_trades(key, batch);
        }
    }

    /// Add every custom-update batch of a map, in key order
    pub fn add_custom_map(&mut self, updates: BTreeMap<String, Vec<CustomUpdate>>) {
        for (key, batch) in updates {
            self.add_custom_updates(key, batch);
        }
    }

    /// Add every quote batch of a map, in key order
    pub fn add_quote_map(&mut self, quotes: BTreeMap<String, Vec<QuoteUpdate>>) {
        for (key, batch) in quotes {
            self.add_quotes(key, batch);
        }
    }

    /// Drop all collected batches
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn event_count(&self) -> usize {
        self.batches.iter().map(FeedBatch::len).sum()
    }

    pub fn batches(&self) -> &[FeedBatch] {
        &self.batches
    }

    /// Validate every batch and build a timeline.
    ///
    /// The ingester keeps its batches, so the same data can be committed again
    /// for a fresh run.
    pub fn commit(&self) -> Result<EventTimeline, InvalidDataError> {
        for batch in &self.batches {
            if let Err(err) = batch.validate() {
                error!(batch = %batch.key, error = %err, "Rejecting input batch");
                return Err(err);
            }
        }

        info!(
            batches = self.batches.len(),
            events = self.event_count(),
            "Market data committed"
        );

        Ok(EventTimeline::new(
            self.batches.iter().map(|b| b.events.clone()).collect(),
        ))
    }

    fn insert(&mut self, kind: FeedKind, key: String, events: Vec<MarketEvent>) {
        debug!(kind = ?kind, key = %key, events = events.len(), "Batch added");

        if let Some(existing) = self
            .batches
            .iter_mut()
            .find(|b| b.kind == kind && b.key == key)
        {
            existing.events = events;
        } else {
            self.batches.push(FeedBatch { kind, key, events });
        }
    }
}
