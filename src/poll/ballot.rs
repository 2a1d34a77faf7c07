//! Ballots, voter secrets and receipts.

use crate::commitment::Randomness;
use crate::oracle::{ProofBlob, ProvedVote, PublicSignals};
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use crate::types::{Nullifier, Vote, VoteCommitment, VotingId};
use crate::verification::Attestation;
use serde::{Deserialize, Serialize};

/// What a voter hands to the server: proof plus public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub proof: ProofBlob,
    pub public_signals: PublicSignals,
}

impl Ballot {
    /// Compact binary form for transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }
}

impl From<ProvedVote> for Ballot {
    fn from(proved: ProvedVote) -> Self {
        Self {
            proof: proved.proof,
            public_signals: proved.public_signals,
        }
    }
}

/// Opening of the ballot's commitment. Handed to `Poll::submit` alongside the
/// ballot; never published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSecret {
    pub vote: Vote,
    pub randomness: Randomness,
}

/// Output of ballot preparation.
#[derive(Debug, Clone)]
pub struct PreparedBallot {
    pub ballot: Ballot,
    pub secret: BallotSecret,
    pub nullifier: Nullifier,
    pub commitment: VoteCommitment,
}

/// Acknowledgement of a durably recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    #[serde(rename = "votingID")]
    pub voting_id: VotingId,
    pub nullifier: Nullifier,
    pub commitment: VoteCommitment,
    pub attestation: Option<Attestation>,
    pub total_votes: u64,
}
