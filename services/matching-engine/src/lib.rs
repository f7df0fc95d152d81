//! Matching Engine Service
//!
//! Simulated order book driven by observed market trades. Strategy orders
//! never trade against each other; they fill against the liquidity that real
//! trades print, using price-time priority among the strategy's own resting
//! orders.
//!
//! **Key Invariants:**
//! - Market orders first, then better prices, then earlier creation time
//! - Every fill executes at the trade price
//! - A trade's quantity is never allocated twice
//! - `filled_quantity <= quantity` for every order
//! - Terminal orders (`Filled`, `Canceled`) never change again

pub mod book;
pub mod matching;
pub mod engine;
pub mod events;

pub use engine::{EngineError, MatchingEngine};
pub use events::{ExecutionEvent, Fill, FillSource, IgnoreReason};
