//! Simulation configuration
//!
//! Two independent, non-negative latencies. Loaded from JSON or built in
//! code; validated before any data is touched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::Timedelta;

/// Construction parameters of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Delay between a strategy command and its effect in the book
    #[serde(default)]
    pub execution_latency: Timedelta,
    /// Delay between a market event and its delivery to the strategy
    #[serde(default)]
    pub market_data_latency: Timedelta,
}

impl SimulationConfig {
    pub fn new(execution_latency: Timedelta, market_data_latency: Timedelta) -> Self {
        Self {
            execution_latency,
            market_data_latency,
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Reject negative latencies
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_latency < 0 {
            return Err(ConfigError::NegativeLatency {
                kind: "execution".to_string(),
                value: self.execution_latency,
            });
        }
        if self.market_data_latency < 0 {
            return Err(ConfigError::NegativeLatency {
                kind: "market data".to_string(),
                value: self.market_data_latency,
            });
        }
        Ok(())
    }
}
