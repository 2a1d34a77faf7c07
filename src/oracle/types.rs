//! Types crossing the prover and verifier boundaries.

use crate::commitment::{Randomness, VoteCommitmentScheme};
use crate::error::{InputError, OracleError};
use crate::hasher::FieldHasher;
use crate::merkle::{Direction, MerkleProof};
use crate::types::{FieldElement, Nullifier, Vote, VoteCommitment, VotingId};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque proof bytes. Never parsed outside the prover/verifier pair.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofBlob(pub Vec<u8>);

impl ProofBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ProofBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofBlob({} bytes)", self.0.len())
    }
}

impl Serialize for ProofBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ProofBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map(ProofBlob).map_err(de::Error::custom)
    }
}

/// Ordered public signals with fixed positions `[root, nullifier, commitment, ...]`.
///
/// The layout is a contract shared by the prover, the verification service
/// and the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSignals(pub Vec<FieldElement>);

impl PublicSignals {
    pub const ROOT: usize = 0;
    pub const NULLIFIER: usize = 1;
    pub const COMMITMENT: usize = 2;
    /// Minimum number of signals a well-formed proof exposes.
    pub const MIN_LEN: usize = 3;

    pub fn new(root: VotingId, nullifier: Nullifier, commitment: VoteCommitment) -> Self {
        Self(vec![root.element(), nullifier.element(), commitment.element()])
    }

    fn at(&self, position: usize) -> Result<FieldElement, InputError> {
        if self.0.len() < Self::MIN_LEN {
            return Err(InputError::MalformedSignals {
                expected: Self::MIN_LEN,
                got: self.0.len(),
            });
        }
        Ok(self.0[position])
    }

    pub fn voting_id(&self) -> Result<VotingId, InputError> {
        self.at(Self::ROOT).map(VotingId)
    }

    pub fn nullifier(&self) -> Result<Nullifier, InputError> {
        self.at(Self::NULLIFIER).map(Nullifier)
    }

    pub fn commitment(&self) -> Result<VoteCommitment, InputError> {
        self.at(Self::COMMITMENT).map(VoteCommitment)
    }

    pub fn as_slice(&self) -> &[FieldElement] {
        &self.0
    }
}

/// Witness handed to the prover.
///
/// Carries exactly what the tree and the commitment scheme produced; see
/// [`ProofRequest::check`].
#[derive(Debug, Clone)]
pub struct ProofRequest {
    pub root: VotingId,
    /// Unhashed leaf encoding of the voter identity.
    pub leaf: FieldElement,
    pub leaf_index: usize,
    pub path_bits: Vec<u8>,
    /// `[leaf_hash, siblings..., root]`
    pub lemma: Vec<FieldElement>,
    pub nullifier: Nullifier,
    pub vote: Vote,
    pub randomness: Randomness,
    pub commitment: VoteCommitment,
}

impl ProofRequest {
    pub fn new(
        root: VotingId,
        leaf: FieldElement,
        proof: &MerkleProof,
        nullifier: Nullifier,
        vote: Vote,
        randomness: Randomness,
        commitment: VoteCommitment,
    ) -> Self {
        Self {
            root,
            leaf,
            leaf_index: proof.leaf_index(),
            path_bits: proof.path_bits(),
            lemma: proof.lemma().to_vec(),
            nullifier,
            vote,
            randomness,
            commitment,
        }
    }

    /// Sibling hashes without the leaf hash and the root.
    pub fn sibling_path(&self) -> &[FieldElement] {
        if self.lemma.len() < 2 {
            return &[];
        }
        &self.lemma[1..self.lemma.len() - 1]
    }

    /// Signals a correct proof for this request must expose.
    pub fn expected_signals(&self) -> PublicSignals {
        PublicSignals::new(self.root, self.nullifier, self.commitment)
    }

    /// Re-derive the leaf hash, the tree path, the nullifier and the
    /// commitment from the witness itself.
    ///
    /// A mismatch means the witness was mis-transcribed and the prover would
    /// produce a proof that can never verify.
    pub fn check<H>(&self, hasher: &H) -> Result<(), OracleError>
    where
        H: FieldHasher + ?Sized,
    {
        let directions = self
            .path_bits
            .iter()
            .map(|bit| {
                Direction::from_bit(*bit)
                    .ok_or_else(|| OracleError::Transcript(format!("invalid path bit {bit}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let proof = MerkleProof::new(self.leaf_index, directions, self.lemma.clone())
            .map_err(|e| OracleError::Transcript(e.to_string()))?;

        let leaf_hash = hasher.hash_one(&self.leaf);
        if proof.leaf_hash() != leaf_hash {
            return Err(OracleError::Transcript(format!(
                "lemma starts with {}, leaf hashes to {}",
                proof.leaf_hash(),
                leaf_hash
            )));
        }
        if proof.claimed_root() != self.root.element() {
            return Err(OracleError::Transcript(format!(
                "lemma ends in {}, request root is {}",
                proof.claimed_root(),
                self.root
            )));
        }
        let recomputed = proof.recompute_root(hasher);
        if recomputed != self.root.element() {
            return Err(OracleError::Transcript(format!(
                "path folds to {}, request root is {}",
                recomputed, self.root
            )));
        }

        let nullifier = hasher.hash_two(&self.root.element(), &self.leaf);
        if nullifier != self.nullifier.element() {
            return Err(OracleError::Transcript(format!(
                "nullifier {} is not derived from the leaf, expected {}",
                self.nullifier, nullifier
            )));
        }

        if !VoteCommitmentScheme::new(hasher).open(&self.commitment, self.vote, &self.randomness) {
            return Err(OracleError::Transcript(
                "commitment does not open to (vote, randomness)".to_string(),
            ));
        }

        Ok(())
    }

    /// Compare prover output with the signals this request implies.
    pub fn check_signals(&self, signals: &PublicSignals) -> Result<(), OracleError> {
        let expected = self.expected_signals();
        for position in 0..PublicSignals::MIN_LEN {
            let got = signals.as_slice().get(position);
            if got != Some(&expected.0[position]) {
                return Err(OracleError::SignalMismatch {
                    position,
                    expected: expected.0[position].to_hex(),
                    got: got.map_or_else(|| "<missing>".to_string(), FieldElement::to_hex),
                });
            }
        }
        Ok(())
    }
}

/// Prover output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvedVote {
    pub proof: ProofBlob,
    pub public_signals: PublicSignals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256FieldHasher;
    use crate::merkle::MerkleTree;

    fn request() -> ProofRequest {
        let h = Sha256FieldHasher;
        let leaves: Vec<_> = (0..4).map(FieldElement::from_u64).collect();
        let tree = MerkleTree::build(&leaves, &h).unwrap();
        let root = VotingId(tree.root());
        let scheme = VoteCommitmentScheme::new(&h);
        let r = Randomness::generate();
        let commitment = scheme.commit(Vote(1), &r);
        let nullifier = scheme.nullifier(&root, "0x2");
        ProofRequest::new(
            root,
            leaves[2],
            &tree.proof(2).unwrap(),
            nullifier,
            Vote(1),
            r,
            commitment,
        )
    }

    #[test]
    fn test_valid_request_passes() {
        assert_eq!(request().check(&Sha256FieldHasher), Ok(()));
    }

    #[test]
    fn test_wrong_index_fails() {
        let mut req = request();
        req.leaf_index = 1;
        assert!(matches!(
            req.check(&Sha256FieldHasher),
            Err(OracleError::Transcript(_))
        ));
    }

    #[test]
    fn test_wrong_sibling_fails() {
        let mut req = request();
        req.lemma[1] = FieldElement::from_u64(777);
        assert!(matches!(
            req.check(&Sha256FieldHasher),
            Err(OracleError::Transcript(_))
        ));
    }

    #[test]
    fn test_wrong_root_fails() {
        let mut req = request();
        req.root = VotingId(FieldElement::from_u64(1));
        assert!(matches!(
            req.check(&Sha256FieldHasher),
            Err(OracleError::Transcript(_))
        ));
    }

    #[test]
    fn test_wrong_vote_fails() {
        let mut req = request();
        req.vote = Vote(0);
        assert!(matches!(
            req.check(&Sha256FieldHasher),
            Err(OracleError::Transcript(_))
        ));
    }

    #[test]
    fn test_wrong_nullifier_fails() {
        let mut req = request();
        req.nullifier = Nullifier(FieldElement::from_u64(0xdead));
        assert!(matches!(
            req.check(&Sha256FieldHasher),
            Err(OracleError::Transcript(msg)) if msg.contains("nullifier")
        ));

        // a nullifier for another voter of the same poll
        let mut req = request();
        req.nullifier = VoteCommitmentScheme::new(&Sha256FieldHasher).nullifier(&req.root, "0x3");
        assert!(req.check(&Sha256FieldHasher).is_err());
    }

    #[test]
    fn test_wrong_leaf_fails() {
        let mut req = request();
        req.leaf = FieldElement::from_u64(3);
        assert!(matches!(
            req.check(&Sha256FieldHasher),
            Err(OracleError::Transcript(msg)) if msg.contains("leaf hashes")
        ));
    }

    #[test]
    fn test_sibling_path_excludes_ends() {
        let req = request();
        assert_eq!(req.sibling_path().len(), 2);
        assert_eq!(req.sibling_path(), &req.lemma[1..3]);
    }

    #[test]
    fn test_check_signals() {
        let req = request();
        assert_eq!(req.check_signals(&req.expected_signals()), Ok(()));

        let mut swapped = req.expected_signals();
        swapped.0.swap(1, 2);
        assert!(matches!(
            req.check_signals(&swapped),
            Err(OracleError::SignalMismatch { position: 1, .. })
        ));

        let short = PublicSignals(vec![req.root.element()]);
        assert!(matches!(
            req.check_signals(&short),
            Err(OracleError::SignalMismatch { position: 1, .. })
        ));
    }

    #[test]
    fn test_signal_accessors() {
        let signals = PublicSignals(vec![
            FieldElement::from_u64(1),
            FieldElement::from_u64(2),
            FieldElement::from_u64(3),
            FieldElement::from_u64(4),
        ]);
        assert_eq!(signals.voting_id().unwrap().element(), FieldElement::from_u64(1));
        assert_eq!(signals.nullifier().unwrap().element(), FieldElement::from_u64(2));
        assert_eq!(signals.commitment().unwrap().element(), FieldElement::from_u64(3));

        let short = PublicSignals(vec![FieldElement::from_u64(1)]);
        assert!(matches!(
            short.nullifier(),
            Err(InputError::MalformedSignals {
                expected: 3,
                got: 1
            })
        ));
    }

    #[test]
    fn test_proof_blob_serializes_as_hex() {
        let blob = ProofBlob(vec![0xde, 0xad]);
        assert_eq!(serde_json::to_string(&blob).unwrap(), "\"dead\"");
        let back: ProofBlob = serde_json::from_str("\"dead\"").unwrap();
        assert_eq!(back, blob);
    }
}
