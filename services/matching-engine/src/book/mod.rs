//! Resting strategy orders of one instrument
//!
//! Market orders sit ahead of every price level; limit orders are kept in
//! price levels ordered by queue priority.

pub mod price_level;
pub mod bid_book;
pub mod ask_book;

pub use price_level::{Allocation, PriceLevel, QueuePriority};
pub use bid_book::BidBook;
pub use ask_book::AskBook;
