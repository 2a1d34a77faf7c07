//! Vote commitments and nullifiers.
//!
//! - `commitment = hash(vote, r)` with `r` drawn from the OS CSPRNG
//! - `nullifier = hash(votingID, leaf(identity))`
//!
//! The nullifier does not depend on the vote, so voting differently never
//! yields a second valid nullifier for the same voter in the same poll.

use crate::hasher::FieldHasher;
use crate::registry::normalize_identity;
use crate::types::{FieldElement, Leaf, Nullifier, Vote, VoteCommitment, VotingId, FIELD_BYTES};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Blinding factor for a vote commitment. Cleared from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Randomness([u8; FIELD_BYTES]);

impl Randomness {
    /// Fresh randomness from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; FIELD_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; FIELD_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_field(&self) -> FieldElement {
        FieldElement::from_bytes(self.0)
    }
}

impl fmt::Debug for Randomness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Randomness(<redacted>)")
    }
}

impl Serialize for Randomness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_field().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Randomness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let element = FieldElement::deserialize(deserializer)?;
        Ok(Self(*element.as_bytes()))
    }
}

/// Commitment and nullifier derivation over an injected hasher.
pub struct VoteCommitmentScheme<'a, H: ?Sized> {
    hasher: &'a H,
}

impl<'a, H> VoteCommitmentScheme<'a, H>
where
    H: FieldHasher + ?Sized,
{
    pub fn new(hasher: &'a H) -> Self {
        Self { hasher }
    }

    /// `hash(vote, r)`
    pub fn commit(&self, vote: Vote, randomness: &Randomness) -> VoteCommitment {
        VoteCommitment(
            self.hasher
                .hash_two(&vote.as_field(), &randomness.as_field()),
        )
    }

    /// Check that `(vote, r)` opens `commitment`.
    pub fn open(&self, commitment: &VoteCommitment, vote: Vote, randomness: &Randomness) -> bool {
        self.commit(vote, randomness) == *commitment
    }

    /// `hash(votingID, leaf(identity))`, one per voter per poll.
    pub fn nullifier(&self, voting_id: &VotingId, identity: &str) -> Nullifier {
        let leaf = Leaf::from_identity(&normalize_identity(identity));
        Nullifier(self.hasher.hash_two(&voting_id.element(), &leaf.element()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256FieldHasher;

    fn voting_id(v: u64) -> VotingId {
        VotingId(FieldElement::from_u64(v))
    }

    #[test]
    fn test_randomness_is_fresh() {
        let a = Randomness::generate();
        let b = Randomness::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_randomness_debug_is_redacted() {
        let r = Randomness::from_bytes([7u8; 32]);
        assert_eq!(format!("{:?}", r), "Randomness(<redacted>)");
    }

    #[test]
    fn test_commitment_hides_behind_randomness() {
        let h = Sha256FieldHasher;
        let scheme = VoteCommitmentScheme::new(&h);
        let r1 = Randomness::generate();
        let r2 = Randomness::generate();

        assert_ne!(scheme.commit(Vote(1), &r1), scheme.commit(Vote(1), &r2));
        assert_ne!(scheme.commit(Vote(0), &r1), scheme.commit(Vote(1), &r1));
    }

    #[test]
    fn test_commitment_opens() {
        let h = Sha256FieldHasher;
        let scheme = VoteCommitmentScheme::new(&h);
        let r = Randomness::generate();
        let c = scheme.commit(Vote(1), &r);

        assert!(scheme.open(&c, Vote(1), &r));
        assert!(!scheme.open(&c, Vote(0), &r));
        assert!(!scheme.open(&c, Vote(1), &Randomness::generate()));
    }

    #[test]
    fn test_nullifier_per_voter_per_poll() {
        let h = Sha256FieldHasher;
        let scheme = VoteCommitmentScheme::new(&h);

        let a = scheme.nullifier(&voting_id(1), "0xA");
        assert_eq!(a, scheme.nullifier(&voting_id(1), "0xa"));
        assert_ne!(a, scheme.nullifier(&voting_id(1), "0xB"));
        assert_ne!(a, scheme.nullifier(&voting_id(2), "0xA"));
    }

    #[test]
    fn test_nullifier_matches_documented_formula() {
        let h = Sha256FieldHasher;
        let scheme = VoteCommitmentScheme::new(&h);
        let root = voting_id(42);

        let expected = h.hash_two(&root.element(), &FieldElement::from_u64(0xc));
        assert_eq!(scheme.nullifier(&root, "0xC").element(), expected);
    }

    #[test]
    fn test_randomness_serde_roundtrip() {
        let r = Randomness::from_bytes([9u8; 32]);
        let json = serde_json::to_string(&r).unwrap();
        let back: Randomness = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
