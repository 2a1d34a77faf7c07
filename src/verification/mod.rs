//! Remote proof verification.
//!
//! The verification service is a long-latency collaborator (network round
//! trip plus consensus wait). [`BoundedVerifier`] wraps any implementation
//! with a per-call timeout and retries for transport failures, so a stalled
//! call resolves to [`crate::error::VerificationError::Timeout`] instead of
//! holding up the caller forever.

pub mod bounded;
pub mod mock;
pub mod traits;

pub use bounded::BoundedVerifier;
pub use mock::{MockVerificationService, MockVerifierMode};
pub use traits::{Attestation, VerificationOutcome, VerificationService};
