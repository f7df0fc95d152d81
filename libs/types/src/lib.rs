//! Types library for the backtesting engine
//!
//! This library provides all core type definitions shared by the market-data
//! timeline, the matching engine and the simulation driver, ensuring type
//! safety and deterministic behavior across a run.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, InstrumentId)
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `order`: Order lifecycle types
//! - `trade`: Observed market trades
//! - `update`: Auxiliary market signals (custom updates, top-of-book quotes)
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod update;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Simulated time, in the nominal units of the input data (nanoseconds by convention).
pub type Timestamp = i64;

/// A span of simulated time, in the same units as [`Timestamp`].
pub type Timedelta = i64;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::update::*;
    pub use crate::errors::*;
    pub use crate::{Timedelta, Timestamp};
}
