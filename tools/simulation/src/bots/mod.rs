//! Sample strategies
//!
//! - `sma_crossover`: trend follower on trade prices, market orders
//! - `reference_quoter`: two-sided limit quotes around another venue's midprice

pub mod reference_quoter;
pub mod sma_crossover;

pub use reference_quoter::{ReferenceQuoter, ReferenceQuoterConfig};
pub use sma_crossover::{SmaCrossover, SmaCrossoverConfig};
