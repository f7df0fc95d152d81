//! Observed market trades
//!
//! A `MarketTrade` is one execution that happened in the real market. It is
//! immutable once recorded and only ever read by the simulation.

use crate::ids::InstrumentId;
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// One execution observed in the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrade {
    /// Exchange time of the execution
    pub timestamp: Timestamp,
    pub instrument: InstrumentId,
    pub price: Price,
    pub quantity: Quantity,
    /// Side that initiated the trade
    pub aggressor_side: Side,
}

impl MarketTrade {
    pub fn new(
        timestamp: Timestamp,
        instrument: impl Into<InstrumentId>,
        price: Price,
        quantity: Quantity,
        aggressor_side: Side,
    ) -> Self {
        Self {
            timestamp,
            instrument: instrument.into(),
            price,
            quantity,
            aggressor_side,
        }
    }

    /// Side of resting orders that this trade can fill
    pub fn passive_side(&self) -> Side {
        self.aggressor_side.opposite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_side() {
        let trade = MarketTrade::new(
            1,
            "X",
            Price::from_u64(100),
            Quantity::from_u64(1),
            Side::Buy,
        );
        assert_eq!(trade.passive_side(), Side::Sell);
    }

    #[test]
    fn test_trade_deserializes_numbers_and_strings() {
        let json = r#"{"timestamp":5,"instrument":"X","price":100.5,"quantity":"2","aggressor_side":"SELL"}"#;
        let trade: MarketTrade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.price, "100.5".parse().unwrap());
        assert_eq!(trade.quantity, Quantity::from_u64(2));
        assert_eq!(trade.aggressor_side, Side::Sell);
    }
}
