//! JSON market-data files
//!
//! ```json
//! {
//!   "trades": { "THE": [ { "timestamp": 1, "instrument": "THE", "price": "30.5",
//!                          "quantity": "2", "aggressor_side": "BUY" } ] },
//!   "custom": { "TTF_midprice": [ { "timestamp": 1, "key": "TTF_midprice", "text": "ttf",
//!                                   "payload": { "midprice": 30.1, "spread": 0.1 } } ] },
//!   "quotes": {}
//! }
//! ```
//!
//! Every section is optional. Batches are added in key order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use types::trade::MarketTrade;
use types::update::{CustomUpdate, QuoteUpdate};

use crate::engine::Simulation;
use crate::strategy::Strategy;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read market data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse market data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Contents of a market-data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDataFile {
    #[serde(default)]
    pub trades: BTreeMap<String, Vec<MarketTrade>>,
    #[serde(default)]
    pub custom: BTreeMap<String, Vec<CustomUpdate>>,
    #[serde(default)]
    pub quotes: BTreeMap<String, Vec<QuoteUpdate>>,
}

impl MarketDataFile {
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), events = data.event_count(), "Market data loaded");
        Ok(data)
    }

    pub fn event_count(&self) -> usize {
        self.trades.values().map(Vec::len).sum::<usize>()
            + self.custom.values().map(Vec::len).sum::<usize>()
            + self.quotes.values().map(Vec::len).sum::<usize>()
    }

    /// Hand every batch to a simulation: trades, then custom updates, then quotes
    pub fn load_into<S: Strategy>(self, simulation: &mut Simulation<S>) {
        simulation
            .add_trade_map(self.trades)
            .add_custom_map(self.custom)
            .add_quote_map(self.quotes);
    }
}
