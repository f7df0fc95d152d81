//! Latency-aware backtesting simulation
//!
//! Replays recorded market data against a strategy and simulates order
//! execution under configurable latency, deterministically: the same data and
//! configuration always produce the same callbacks, fills and run digest.
//!
//! # Modules
//! - `config`: Latency configuration (JSON)
//! - `latency`: Latency model
//! - `actions`: Delayed strategy actions and their queue
//! - `router`: Command validation and scheduling
//! - `strategy`: Strategy callbacks and command context
//! - `engine`: Event dispatcher and run journal
//! - `replay`: Journal digests and determinism validation
//! - `export`: Run export to JSON
//! - `loader`: JSON market-data files
//! - `synthetic`: Seeded synthetic trade tapes
//! - `bots`: Sample strategies

pub mod actions;
pub mod bots;
pub mod config;
pub mod engine;
pub mod export;
pub mod latency;
pub mod loader;
pub mod replay;
pub mod router;
pub mod strategy;
pub mod synthetic;

pub use config::SimulationConfig;
pub use engine::{RunSummary, SimEvent, Simulation};
pub use latency::{LatencyKind, LatencyModel};
pub use strategy::{Strategy, StrategyContext};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
