//! Auxiliary market signals
//!
//! Custom updates carry arbitrary strategy inputs (reference midprices,
//! signals from other venues) keyed by topic. Quote updates carry the
//! top of book of an instrument. Neither drives fills; both are merged into
//! the same timeline as trades and delivered to the strategy.

use crate::ids::InstrumentId;
use crate::numeric::{Price, Quantity};
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload of a custom update: one scalar or a set of named scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomPayload {
    Value(f64),
    Fields(BTreeMap<String, f64>),
}

impl CustomPayload {
    /// Scalar value, if this payload is a single value
    pub fn value(&self) -> Option<f64> {
        match self {
            CustomPayload::Value(v) => Some(*v),
            CustomPayload::Fields(_) => None,
        }
    }

    /// Named field, if this payload is a field set
    pub fn field(&self, name: &str) -> Option<f64> {
        match self {
            CustomPayload::Value(_) => None,
            CustomPayload::Fields(fields) => fields.get(name).copied(),
        }
    }
}

/// An arbitrary auxiliary market signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomUpdate {
    pub timestamp: Timestamp,
    /// Instrument or topic the update belongs to
    pub key: String,
    #[serde(default)]
    pub text: String,
    pub payload: CustomPayload,
}

impl CustomUpdate {
    pub fn new(
        timestamp: Timestamp,
        key: impl Into<String>,
        text: impl Into<String>,
        payload: CustomPayload,
    ) -> Self {
        Self {
            timestamp,
            key: key.into(),
            text: text.into(),
            payload,
        }
    }
}

/// Top-of-book snapshot for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    pub timestamp: Timestamp,
    pub instrument: InstrumentId,
    pub bid_price: Price,
    pub bid_quantity: Quantity,
    pub ask_price: Price,
    pub ask_quantity: Quantity,
}

impl QuoteUpdate {
    /// Mid price, or None when either side is empty
    pub fn mid_price(&self) -> Option<Price> {
        if self.bid_price.is_zero() || self.ask_price.is_zero() {
            return None;
        }
        Price::try_new((self.bid_price.as_decimal() + self.ask_price.as_decimal()) / rust_decimal::Decimal::TWO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accessors() {
        let scalar = CustomPayload::Value(1.5);
        assert_eq!(scalar.value(), Some(1.5));
        assert_eq!(scalar.field("midprice"), None);

        let mut fields = BTreeMap::new();
        fields.insert("midprice".to_string(), 30.25);
        let fields = CustomPayload::Fields(fields);
        assert_eq!(fields.field("midprice"), Some(30.25));
        assert_eq!(fields.field("spread"), None);
        assert_eq!(fields.value(), None);
    }

    #[test]
    fn test_payload_untagged_serialization() {
        let update: CustomUpdate =
            serde_json::from_str(r#"{"timestamp":3,"key":"ttf","payload":{"midprice":30.0,"spread":0.1}}"#)
                .unwrap();
        assert_eq!(update.text, "");
        assert_eq!(update.payload.field("spread"), Some(0.1));

        let update: CustomUpdate =
            serde_json::from_str(r#"{"timestamp":3,"key":"signal","text":"go","payload":2.0}"#).unwrap();
        assert_eq!(update.payload.value(), Some(2.0));
    }

    #[test]
    fn test_quote_mid_price() {
        let quote = QuoteUpdate {
            timestamp: 1,
            instrument: InstrumentId::new("X"),
            bid_price: Price::from_u64(99),
            bid_quantity: Quantity::from_u64(1),
            ask_price: Price::from_u64(101),
            ask_quantity: Quantity::from_u64(1),
        };
        assert_eq!(quote.mid_price(), Some(Price::from_u64(100)));
    }
}
