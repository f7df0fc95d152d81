//! Latency model
//!
//! Pure function of a nominal time and a direction. It never reorders
//! anything itself; reordering emerges when the dispatcher merges delayed
//! actions with delayed market events.

use types::errors::ConfigError;
use types::{Timedelta, Timestamp};

use crate::config::SimulationConfig;

/// Direction of a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyKind {
    /// Market event travelling to the strategy
    MarketDataDelivery,
    /// Strategy command travelling to the book
    OrderAction,
}

/// Fixed, non-negative latencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyModel {
    execution: Timedelta,
    market_data: Timedelta,
}

impl LatencyModel {
    /// Build a model; negative latencies are a configuration error
    pub fn new(execution: Timedelta, market_data: Timedelta) -> Result<Self, ConfigError> {
        SimulationConfig::new(execution, market_data).validate()?;
        Ok(Self {
            execution,
            market_data,
        })
    }

    /// Effective time of something that happened at `nominal`
    pub fn delay(&self, nominal: Timestamp, kind: LatencyKind) -> Timestamp {
        nominal.saturating_add(self.latency(kind))
    }

    pub fn latency(&self, kind: LatencyKind) -> Timedelta {
        match kind {
            LatencyKind::MarketDataDelivery => self.market_data,
            LatencyKind::OrderAction => self.execution,
        }
    }
}

impl TryFrom<&SimulationConfig> for LatencyModel {
    type Error = ConfigError;

    fn try_from(config: &SimulationConfig) -> Result<Self, Self::Error> {
        Self::new(config.execution_latency, config.market_data_latency)
    }
}
