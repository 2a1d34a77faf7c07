//! Voter Registry - ordered, deduplicated voter identities
//!
//! The registry assigns every voter a stable index equal to its position in
//! the input list. Once a poll opens the registry is sealed and the mapping
//! never changes again.
//!
//! ## Padding
//!
//! The tree needs a power-of-two leaf count, so the list is extended by
//! repeating the *last* real voter. Padding duplicates that voter's
//! membership path, not their voting right: the nullifier is derived from the
//! identity, so every padded slot yields the same nullifier as the original.

use crate::error::InputError;
use crate::types::{FieldElement, Leaf};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// How the voter list is extended to a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaddingPolicy {
    /// Smallest power of two holding every voter.
    #[default]
    NextPowerOfTwo,
    /// Fixed tree of `2^depth` leaves regardless of voter count.
    FixedDepth(u32),
}

impl PaddingPolicy {
    /// Padded leaf count for `voters` real entries.
    pub fn capacity(&self, voters: usize) -> Result<usize, InputError> {
        match *self {
            PaddingPolicy::NextPowerOfTwo => Ok(voters.max(1).next_power_of_two()),
            PaddingPolicy::FixedDepth(depth) => {
                let capacity = 1usize
                    .checked_shl(depth)
                    .ok_or(InputError::CapacityExceeded {
                        voters,
                        capacity: 0,
                    })?;
                if voters > capacity {
                    return Err(InputError::CapacityExceeded { voters, capacity });
                }
                Ok(capacity)
            }
        }
    }
}

/// On-disk registry format: `{"voters": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub voters: Vec<String>,
}

/// Trim and lower-case an identity for lookup.
///
/// Hex identities also drop leading zeros (`0x0a` becomes `0xa`), since they
/// encode to the same leaf.
pub fn normalize_identity(identity: &str) -> String {
    let lowered = identity.trim().to_lowercase();
    match lowered.strip_prefix("0x") {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
            let significant = digits.trim_start_matches('0');
            if significant.is_empty() {
                "0x0".to_string()
            } else {
                format!("0x{significant}")
            }
        }
        _ => lowered,
    }
}

/// Ordered voter list with an O(1) identity→index map.
#[derive(Debug, Clone, Default)]
pub struct VoterRegistry {
    voters: Vec<String>,
    index: HashMap<String, usize>,
    sealed: bool,
}

impl VoterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an ordered identity list. Order defines the indices.
    pub fn from_identities<I, S>(identities: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for identity in identities {
            registry.push(identity.as_ref())?;
        }
        if registry.is_empty() {
            return Err(InputError::EmptyRegistry);
        }
        Ok(registry)
    }

    /// Parse the `{"voters": [...]}` JSON format.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|e| InputError::MalformedRegistry(e.to_string()))?;
        Self::from_identities(file.voters)
    }

    /// Load a registry file from disk.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InputError::MalformedRegistry(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Append a voter, returning its index.
    ///
    /// Fails once sealed; indices of existing voters never move.
    pub fn push(&mut self, identity: &str) -> Result<usize, InputError> {
        if self.sealed {
            return Err(InputError::RegistrySealed);
        }

        let normalized = normalize_identity(identity);
        if normalized.is_empty() {
            return Err(InputError::EmptyIdentity);
        }
        if self.index.contains_key(&normalized) {
            return Err(InputError::DuplicateVoter(normalized));
        }

        let position = self.voters.len();
        self.index.insert(normalized.clone(), position);
        self.voters.push(normalized);
        Ok(position)
    }

    /// Freeze index assignment.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of real voters.
    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn voters(&self) -> &[String] {
        &self.voters
    }

    /// Index of a voter, if registered.
    pub fn lookup(&self, identity: &str) -> Option<usize> {
        self.index.get(&normalize_identity(identity)).copied()
    }

    /// Index of a voter, failing with `UnknownVoter`.
    pub fn index_of(&self, identity: &str) -> Result<usize, InputError> {
        self.lookup(identity)
            .ok_or_else(|| InputError::UnknownVoter(identity.to_string()))
    }

    /// Identity occupying a padded slot; padding slots resolve to the last voter.
    pub fn identity_at(&self, index: usize) -> Option<&str> {
        self.voters
            .get(index)
            .or_else(|| self.voters.last())
            .map(String::as_str)
    }

    /// Identities extended to the policy's capacity by repeating the last entry.
    pub fn padded_identities(&self, policy: PaddingPolicy) -> Result<Vec<&str>, InputError> {
        let last = self.voters.last().ok_or(InputError::EmptyRegistry)?;
        let capacity = policy.capacity(self.voters.len())?;

        let mut padded: Vec<&str> = self.voters.iter().map(String::as_str).collect();
        padded.resize(capacity, last.as_str());
        Ok(padded)
    }

    /// Leaf encodings of the padded identity list.
    pub fn padded_leaves(&self, policy: PaddingPolicy) -> Result<Vec<FieldElement>, InputError> {
        Ok(self
            .padded_identities(policy)?
            .into_iter()
            .map(|id| Leaf::from_identity(id).element())
            .collect())
    }
}
