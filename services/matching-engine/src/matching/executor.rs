//! Fill execution logic
//!
//! Applies an allocation to an order and produces the `Fill` record. The
//! executor owns the fill sequence so fills are numbered in execution order.

use thiserror::Error;
use types::errors::TransitionError;
use types::numeric::{Price, Quantity};
use types::order::Order;
use types::Timestamp;

use crate::events::{Fill, FillSource};

/// Match executor for handling fill generation
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: starting_sequence,
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Execute `quantity` of `order` at the trade price
    pub fn execute_fill(
        &mut self,
        order: &mut Order,
        quantity: Quantity,
        price: Price,
        timestamp: Timestamp,
        source: FillSource,
    ) -> Result<Fill, MatchError> {
        if !quantity.is_positive() {
            return Err(MatchError::InvalidQuantity(quantity));
        }

        order.apply_fill(quantity, price, timestamp)?;

        Ok(Fill {
            sequence: self.next_sequence(),
            order_id: order.id,
            instrument: order.instrument.clone(),
            side: order.side,
            price,
            quantity,
            timestamp,
            source,
        })
    }

    /// Number of fills executed so far
    pub fn fill_count(&self) -> u64 {
        self.sequence_counter
    }
}

impl Default for MatchExecutor {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Match execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Fill quantity must be positive, got {0}")]
    InvalidQuantity(Quantity),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
