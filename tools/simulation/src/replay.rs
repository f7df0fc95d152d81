//! Run journal digests and deterministic replay validation
//!
//! Same inputs and configuration must produce the same journal, entry for
//! entry. A run is identified by the SHA-256 of its journal; two runs are
//! compared entry by entry so a divergence can be located.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};
use types::errors::SimulationError;

use crate::engine::{SimEvent, Simulation};
use crate::strategy::Strategy;

/// Hex SHA-256 over the journal entries in order
pub fn journal_digest(journal: &[SimEvent]) -> String {
    let mut hasher = Sha256::new();

    for event in journal {
        hasher.update(serde_json::to_vec(event).unwrap_or_default());
        hasher.update(b"\n");
    }

    format!("{:x}", hasher.finalize())
}

/// Outcome of comparing two runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayValidation {
    pub matches: bool,
    pub original_digest: String,
    pub replayed_digest: String,
    pub original_len: usize,
    pub replayed_len: usize,
    /// First journal position where the runs disagree
    pub divergence_index: Option<usize>,
}

/// Compare two journals entry by entry
pub fn compare_journals(original: &[SimEvent], replayed: &[SimEvent]) -> ReplayValidation {
    let divergence_index = original
        .iter()
        .zip(replayed)
        .position(|(a, b)| a != b)
        .or_else(|| (original.len() != replayed.len()).then(|| original.len().min(replayed.len())));

    ReplayValidation {
        matches: divergence_index.is_none(),
        original_digest: journal_digest(original),
        replayed_digest: journal_digest(replayed),
        original_len: original.len(),
        replayed_len: replayed.len(),
        divergence_index,
    }
}

/// Build a scenario twice, run both and compare their journals.
///
/// `build` must produce an equivalent simulation each time, with a fresh
/// strategy.
pub fn verify_determinism<S, F>(mut build: F) -> Result<ReplayValidation, SimulationError>
where
    S: Strategy,
    F: FnMut() -> Result<Simulation<S>, SimulationError>,
{
    let mut original = build()?;
    original.run()?;
    let mut replayed = build()?;
    replayed.run()?;

    let validation = compare_journals(original.journal(), replayed.journal());
    if validation.matches {
        info!(digest = %validation.original_digest, entries = validation.original_len, "Replay matches");
    } else {
        error!(
            original = %validation.original_digest,
            replayed = %validation.replayed_digest,
            divergence = ?validation.divergence_index,
            "Replay diverged"
        );
    }
    Ok(validation)
}

/// Export a journal as JSON
pub fn export_journal(journal: &[SimEvent]) -> String {
    serde_json::to_string_pretty(journal).unwrap_or_default()
}

/// Import a journal from JSON
pub fn import_journal(json: &str) -> Result<Vec<SimEvent>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::FeedKind;
    use matching_engine::FillSource;
    use types::ids::OrderId;
    use types::numeric::{Price, Quantity};

    fn delivered(at: i64) -> SimEvent {
        SimEvent::MarketDelivered {
            at,
            feed: FeedKind::Trades,
            key: "X".to_string(),
            exchange_timestamp: at,
        }
    }

    fn filled(at: i64) -> SimEvent {
        SimEvent::OrderFilled {
            at,
            order_id: OrderId::new(1),
            price: Price::from_u64(100),
            quantity: Quantity::from_u64(1),
            filled_quantity: Quantity::from_u64(1),
            source: FillSource::RestingOrder,
        }
    }

    #[test]
    fn test_digest_is_stable_and_order_sensitive() {
        let journal = vec![delivered(1), filled(1)];
        assert_eq!(journal_digest(&journal), journal_digest(&journal.clone()));
        assert_eq!(journal_digest(&journal).len(), 64);

        let swapped = vec![filled(1), delivered(1)];
        assert_ne!(journal_digest(&journal), journal_digest(&swapped));
    }

    #[test]
    fn test_compare_identical() {
        let journal = vec![delivered(1), filled(2)];
        let validation = compare_journals(&journal, &journal);
        assert!(validation.matches);
        assert_eq!(validation.divergence_index, None);
        assert_eq!(validation.original_digest, validation.replayed_digest);
    }

    #[test]
    fn test_compare_locates_divergence() {
        let original = vec![delivered(1), filled(2), delivered(3)];
        let replayed = vec![delivered(1), filled(3), delivered(3)];
        assert_eq!(compare_journals(&original, &replayed).divergence_index, Some(1));

        let truncated = vec![delivered(1)];
        let validation = compare_journals(&original, &truncated);
        assert!(!validation.matches);
        assert_eq!(validation.divergence_index, Some(1));
    }

    #[test]
    fn test_journal_roundtrip() {
        let journal = vec![delivered(1), filled(2)];
        let json = export_journal(&journal);
        assert!(json.contains("\"event\": \"order_filled\""));
        assert_eq!(import_journal(&json).unwrap(), journal);
    }

    #[test]
    fn test_empty_digest() {
        // SHA-256 of no input
        assert_eq!(
            journal_digest(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
