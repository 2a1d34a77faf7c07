//! Trait abstraction for the zero-knowledge prover.
//!
//! Enables mock implementations for testing; the real prover (circuit wasm +
//! proving key) lives outside this crate.

use super::types::{ProofRequest, ProvedVote};
use crate::error::OracleError;
use async_trait::async_trait;

/// Opaque proving oracle.
///
/// Implementations receive a request that has already passed
/// [`ProofRequest::check`]; they must return public signals laid out as
/// `[root, nullifier, commitment, ...]`.
#[async_trait]
pub trait ProofOracle: Send + Sync {
    async fn prove(&self, request: &ProofRequest) -> Result<ProvedVote, OracleError>;
}
