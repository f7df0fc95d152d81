//! Error types for the backtesting engine
//!
//! Setup errors (`ConfigError`, `InvalidDataError`) are fatal and surface
//! before the first event is dispatched. Command errors (`InvalidOrderError`,
//! `UnknownOrderError`) are local rejections returned to the strategy; the
//! simulation continues.

use crate::ids::OrderId;
use crate::order::OrderState;
use crate::Timestamp;
use thiserror::Error;

/// Top-level setup error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid data: {0}")]
    InvalidData(#[from] InvalidDataError),

    /// The book rejected an action the dispatcher believed legal
    #[error("Matching engine error: {0}")]
    Engine(String),
}

/// Invalid construction parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{kind} latency must be non-negative, got {value}")]
    NegativeLatency { kind: String, value: i64 },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration: {0}")]
    Io(String),
}

/// Malformed input batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidDataError {
    #[error("batch {batch} is not time-ordered: entry {index} at {timestamp} follows {previous}")]
    NonMonotonic {
        batch: String,
        index: usize,
        previous: Timestamp,
        timestamp: Timestamp,
    },

    #[error("batch {batch} entry {index} has a non-finite {field}")]
    NonFinite {
        batch: String,
        index: usize,
        field: String,
    },
}

/// Malformed order at submission
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidOrderError {
    #[error("Invalid quantity: {0}")]
    NonPositiveQuantity(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Quantity {0} exceeds the per-order maximum")]
    QuantityTooLarge(String),
}

/// Cancel or modify referencing an order the simulation never issued
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown order: {order_id}")]
pub struct UnknownOrderError {
    pub order_id: OrderId,
}

/// Rejection of a strategy command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    InvalidOrder(#[from] InvalidOrderError),

    #[error(transparent)]
    UnknownOrder(#[from] UnknownOrderError),
}

/// Illegal order state transition
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid state transition for order {order_id} from {from} to {to}")]
pub struct TransitionError {
    pub order_id: OrderId,
    pub from: OrderState,
    pub to: OrderState,
}
