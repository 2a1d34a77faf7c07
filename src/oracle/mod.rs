//! Proof oracle boundary.
//!
//! The zero-knowledge prover is an external collaborator. This module fixes
//! the typed witness it consumes, the public-signal layout it must emit, and
//! the local transcription checks that run before it is ever called.

pub mod mock;
pub mod traits;
pub mod types;

pub use mock::MockProofOracle;
pub use traits::ProofOracle;
pub use types::{ProofBlob, ProofRequest, ProvedVote, PublicSignals};
