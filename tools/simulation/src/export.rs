//! Run export
//!
//! Serializes the outcome of a run (summary, filled orders and optionally the
//! full journal) to JSON for external consumption.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::order::FilledOrderReport;

use crate::config::SimulationConfig;
use crate::engine::{RunSummary, SimEvent, Simulation};
use crate::strategy::Strategy;

/// Export failures
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Combined export of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub config: SimulationConfig,
    pub summary: RunSummary,
    pub filled_orders: Vec<FilledOrderReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<Vec<SimEvent>>,
}

/// Build an export from a simulation that has run
pub fn build_export<S: Strategy>(
    simulation: &Simulation<S>,
    summary: &RunSummary,
    include_journal: bool,
) -> SimulationExport {
    SimulationExport {
        version: crate::VERSION.to_string(),
        config: *simulation.config(),
        summary: summary.clone(),
        filled_orders: simulation.filled_orders(),
        journal: include_journal.then(|| simulation.journal().to_vec()),
    }
}

/// `GetFilledOrders()` as pretty JSON
pub fn filled_orders_json(filled: &[FilledOrderReport]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(filled)?)
}

/// Export as pretty JSON
pub fn export_json(export: &SimulationExport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(export)?)
}

/// Write an export to a file path
pub fn write_to_file(export: &SimulationExport, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let json = export_json(export)?;
    std::fs::write(path, json)?;
    Ok(())
}
