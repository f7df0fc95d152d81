//! Matching logic module
//!
//! Eligibility of orders against trade prints, and fill execution

pub mod crossing;
pub mod executor;

pub use crossing::{limit_crosses, order_can_fill, TradeResidual};
pub use executor::{MatchError, MatchExecutor};
