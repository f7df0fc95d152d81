//! Market event definitions
//!
//! Defines the `MarketEvent` enum carried by the timeline. Every variant is an
//! immutable observation with an exchange timestamp; the timeline orders
//! events by that timestamp and the simulation delays delivery by the
//! market-data latency.

use serde::{Deserialize, Serialize};
use types::trade::MarketTrade;
use types::update::{CustomUpdate, QuoteUpdate};
use types::Timestamp;

/// Kind of input batch, used to keep same-named feeds of different kinds apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedKind {
    Trades,
    Custom,
    Quotes,
}

/// One event on the market-data timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum MarketEvent {
    /// An execution observed in the market
    Trade(MarketTrade),
    /// An auxiliary signal
    Custom(CustomUpdate),
    /// A top-of-book snapshot
    Quote(QuoteUpdate),
}

impl MarketEvent {
    /// Exchange timestamp of the event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            MarketEvent::Trade(trade) => trade.timestamp,
            MarketEvent::Custom(update) => update.timestamp,
            MarketEvent::Quote(quote) => quote.timestamp,
        }
    }

    /// Instrument symbol or custom topic
    pub fn key(&self) -> &str {
        match self {
            MarketEvent::Trade(trade) => trade.instrument.as_str(),
            MarketEvent::Custom(update) => &update.key,
            MarketEvent::Quote(quote) => quote.instrument.as_str(),
        }
    }

    /// Short label for logs
    pub fn event_type_label(&self) -> &'static str {
        match self {
            MarketEvent::Trade(_) => "trade",
            MarketEvent::Custom(_) => "custom",
            MarketEvent::Quote(_) => "quote",
        }
    }

    pub fn feed_kind(&self) -> FeedKind {
        match self {
            MarketEvent::Trade(_) => FeedKind::Trades,
            MarketEvent::Custom(_) => FeedKind::Custom,
            MarketEvent::Quote(_) => FeedKind::Quotes,
        }
    }
}

impl From<MarketTrade> for MarketEvent {
    fn from(trade: MarketTrade) -> Self {
        MarketEvent::Trade(trade)
    }
}

impl From<CustomUpdate> for MarketEvent {
    fn from(update: CustomUpdate) -> Self {
        MarketEvent::Custom(update)
    }
}

impl From<QuoteUpdate> for MarketEvent {
    fn from(quote: QuoteUpdate) -> Self {
        MarketEvent::Quote(quote)
    }
}
