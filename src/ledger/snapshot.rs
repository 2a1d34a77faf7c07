//! Persisted ledger snapshot.

use super::LedgerState;
use crate::error::PersistenceError;
use crate::types::{Nullifier, Vote, VotingId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Durable ledger state.
///
/// JSON shape:
/// `{"votingID": "0x…" | null, "tally": {"1": 3}, "spentNullifiers": ["0x…"], "closed": false}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(rename = "votingID")]
    pub voting_id: Option<VotingId>,

    #[serde(default)]
    pub tally: BTreeMap<Vote, u64>,

    #[serde(rename = "spentNullifiers", default)]
    pub spent_nullifiers: BTreeSet<Nullifier>,

    #[serde(default)]
    pub closed: bool,
}

impl LedgerSnapshot {
    pub fn state(&self) -> LedgerState {
        if self.closed {
            LedgerState::Closed
        } else {
            LedgerState::Open
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.tally.values().sum()
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::Encode(e.to_string()))
    }

    /// Parse and sanity-check a stored snapshot.
    ///
    /// Every accepted vote spends exactly one nullifier, so the tally total
    /// must equal the spent-set size.
    pub fn from_json(json: &str, location: &str) -> Result<Self, PersistenceError> {
        let snapshot: LedgerSnapshot =
            serde_json::from_str(json).map_err(|e| PersistenceError::Corrupt {
                location: location.to_string(),
                reason: e.to_string(),
            })?;

        let spent = snapshot.spent_nullifiers.len() as u64;
        if snapshot.total_votes() != spent {
            return Err(PersistenceError::Corrupt {
                location: location.to_string(),
                reason: format!(
                    "tally counts {} votes but {} nullifiers are spent",
                    snapshot.total_votes(),
                    spent
                ),
            });
        }
        if snapshot.voting_id.is_none() && spent > 0 {
            return Err(PersistenceError::Corrupt {
                location: location.to_string(),
                reason: "votes recorded without a voting ID".to_string(),
            });
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldElement;

    fn sample() -> LedgerSnapshot {
        let mut snapshot = LedgerSnapshot {
            voting_id: Some(VotingId(FieldElement::from_u64(0xabc))),
            ..Default::default()
        };
        snapshot.tally.insert(Vote(1), 2);
        snapshot
            .spent_nullifiers
            .insert(Nullifier(FieldElement::from_u64(1)));
        snapshot
            .spent_nullifiers
            .insert(Nullifier(FieldElement::from_u64(2)));
        snapshot
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert!(json["votingID"].as_str().unwrap().starts_with("0x"));
        assert_eq!(json["tally"]["1"], 2);
        assert_eq!(json["spentNullifiers"].as_array().unwrap().len(), 2);
        assert_eq!(json["closed"], false);
    }

    #[test]
    fn test_parse_roundtrip() {
        let snapshot = sample();
        let parsed = LedgerSnapshot::from_json(&snapshot.to_json().unwrap(), "test").unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_parse_legacy_without_closed_flag() {
        let parsed =
            LedgerSnapshot::from_json(r#"{"votingID": null, "tally": {}, "spentNullifiers": []}"#, "test")
                .unwrap();
        assert_eq!(parsed, LedgerSnapshot::default());
        assert_eq!(parsed.state(), LedgerState::Open);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            LedgerSnapshot::from_json("{not json", "test"),
            Err(PersistenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_inconsistent_counts() {
        let mut snapshot = sample();
        snapshot.tally.insert(Vote(0), 5);
        let json = snapshot.to_json().unwrap();
        assert!(matches!(
            LedgerSnapshot::from_json(&json, "test"),
            Err(PersistenceError::Corrupt { reason, .. }) if reason.contains("tally counts 7")
        ));
    }
}
