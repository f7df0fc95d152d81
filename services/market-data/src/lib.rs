//! Market Data Timeline
//!
//! Turns independent, individually time-ordered input batches into a single
//! ascending-timestamp event stream:
//! - Trades per instrument
//! - Custom updates per topic (reference prices, external signals)
//! - Top-of-book quotes per instrument
//!
//! # Architecture
//!
//! ```text
//!  trades[A]  trades[B]  custom[sig]  quotes[A]
//!      │          │           │           │
//!    ┌─▼──────────▼───────────▼───────────▼─┐
//!    │  FeedIngester   ← validates ordering │
//!    └──────────────────┬───────────────────┘
//!                       │ commit()
//!    ┌──────────────────▼───────────────────┐
//!    │  EventTimeline  ← lazy k-way merge   │
//!    └──────────────────┬───────────────────┘
//!                       ▼
//!                  simulation
//! ```
//!
//! Ordering is total and reproducible: timestamp, then batch insertion order,
//! then position within the batch.

pub mod events;
pub mod ingestion;
pub mod timeline;

pub use events::{FeedKind, MarketEvent};
pub use ingestion::{FeedBatch, FeedIngester};
pub use timeline::EventTimeline;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
