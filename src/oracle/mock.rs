//! Mock proof oracle for testing.
//!
//! Produces a hash transcript over the public signals, CBOR-encoded, instead
//! of a zero-knowledge proof. [`crate::verification::MockVerificationService`]
//! accepts exactly these transcripts.

use super::traits::ProofOracle;
use super::types::{ProofBlob, ProofRequest, ProvedVote, PublicSignals};
use crate::error::OracleError;
use crate::serialization::{from_cbor, to_cbor};
use crate::types::FieldElement;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

const TRANSCRIPT_TAG: &[u8] = b"zkballot-mock-proof-v1";

/// What the mock "proof" blob decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockTranscript {
    pub public_signals: Vec<FieldElement>,
    pub digest: [u8; 32],
}

fn transcript_digest(signals: &[FieldElement]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(TRANSCRIPT_TAG);
    for signal in signals {
        hasher.update(signal.as_bytes());
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Check a blob produced by [`MockProofOracle`] against the signals it claims.
pub fn transcript_matches(blob: &ProofBlob, signals: &PublicSignals) -> bool {
    match from_cbor::<MockTranscript>(blob.as_bytes()) {
        Ok(transcript) => {
            transcript.public_signals == signals.0
                && transcript.digest == transcript_digest(&transcript.public_signals)
        }
        Err(_) => false,
    }
}

/// Mock proving oracle.
#[derive(Clone, Default)]
pub struct MockProofOracle {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    fail_next: AtomicU32,
    tamper_signals: AtomicBool,
    calls: AtomicU32,
}

impl MockProofOracle {
    /// Create new mock oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` calls fail with a retryable `ProvingFailed`.
    pub fn fail_next(&self, count: u32) {
        self.state.fail_next.store(count, Ordering::SeqCst);
    }

    /// Emit a wrong commitment signal (simulates a mis-wired circuit).
    pub fn tamper_signals(&self, enabled: bool) {
        self.state.tamper_signals.store(enabled, Ordering::SeqCst);
    }

    /// Number of `prove` calls so far.
    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofOracle for MockProofOracle {
    async fn prove(&self, request: &ProofRequest) -> Result<ProvedVote, OracleError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .state
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(OracleError::ProvingFailed(
                "mock prover failure".to_string(),
            ));
        }

        let mut signals = request.expected_signals();
        if self.state.tamper_signals.load(Ordering::SeqCst) {
            signals.0[PublicSignals::COMMITMENT] = FieldElement::ZERO;
        }

        let transcript = MockTranscript {
            digest: transcript_digest(&signals.0),
            public_signals: signals.0.clone(),
        };
        let proof = to_cbor(&transcript)
            .map(ProofBlob)
            .map_err(|e| OracleError::ProvingFailed(e.to_string()))?;

        Ok(ProvedVote {
            proof,
            public_signals: signals,
        })
    }
}
