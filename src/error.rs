//! Error taxonomy for the voting protocol.
//!
//! Every variant here is recoverable at the orchestration layer: a failed
//! submission is reported to its caller and never affects other submissions.
//! The one fatal case, an unreadable ledger at startup, surfaces as
//! [`PersistenceError::Corrupt`] from [`crate::ledger::VotingLedger::load`].

use crate::merkle::MerkleError;
use crate::types::{Nullifier, Vote, VotingId};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Rejected before any proof work.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown voter: {0}")]
    UnknownVoter(String),

    #[error("invalid vote {vote}: poll has {choices} choices")]
    InvalidVote { vote: Vote, choices: usize },

    #[error("vote {vote} does not open the ballot commitment")]
    CommitmentMismatch { vote: Vote },

    #[error("duplicate voter identity: {0}")]
    DuplicateVoter(String),

    #[error("voter identity is empty")]
    EmptyIdentity,

    #[error("voter registry is empty")]
    EmptyRegistry,

    #[error("voter registry is sealed; index assignment is frozen")]
    RegistrySealed,

    #[error("{voters} voters exceed tree capacity {capacity}")]
    CapacityExceeded { voters: usize, capacity: usize },

    #[error("malformed public signals: expected at least {expected}, got {got}")]
    MalformedSignals { expected: usize, got: usize },

    #[error("registry file is malformed: {0}")]
    MalformedRegistry(String),

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// Ledger-level protocol violations. No state change accompanies these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("voting ID mismatch: ledger has {expected:?}, submission references {got}")]
    RootMismatch {
        expected: Option<VotingId>,
        got: VotingId,
    },

    #[error("nullifier already spent: {0}")]
    AlreadySpent(Nullifier),

    #[error("ledger is closed")]
    LedgerClosed,

    #[error("ledger is bound to voting ID {current}; cannot rebind to {requested}")]
    VotingIdLocked {
        current: VotingId,
        requested: VotingId,
    },
}

/// Local proving failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The prover itself failed; retryable with fresh randomness.
    #[error("proving failed: {0}")]
    ProvingFailed(String),

    /// The witness handed to the prover does not match the tree/commitment.
    #[error("proof input transcription mismatch: {0}")]
    Transcript(String),

    /// The prover returned public signals that differ from its inputs.
    #[error("public signal {position} mismatch: expected {expected}, got {got}")]
    SignalMismatch {
        position: usize,
        expected: String,
        got: String,
    },
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OracleError::ProvingFailed(_))
    }
}

/// Failures of the remote verification service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("verification service unreachable: {0}")]
    Unreachable(String),

    #[error("proof rejected by verification service")]
    Rejected,

    #[error("verification timed out after {0:?}")]
    Timeout(Duration),

    #[error("verification service error: {0}")]
    Service(String),
}

impl VerificationError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::Unreachable(_))
    }
}

/// Ledger durability failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("ledger I/O failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode ledger snapshot: {0}")]
    Encode(String),

    #[error("ledger snapshot at '{location}' is corrupt: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from [`crate::ledger::VotingLedger`] mutations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The vote may not be durably recorded; in-memory state was rolled back.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Umbrella error for a single vote submission.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<LedgerError> for VoteError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Protocol(e) => VoteError::Protocol(e),
            LedgerError::Persistence(e) => VoteError::Persistence(e),
        }
    }
}

impl From<MerkleError> for VoteError {
    fn from(err: MerkleError) -> Self {
        VoteError::Input(InputError::Merkle(err))
    }
}
