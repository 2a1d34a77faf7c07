//! Mock verification service for testing.

use super::traits::{Attestation, VerificationOutcome, VerificationService};
use crate::error::VerificationError;
use crate::oracle::mock::transcript_matches;
use crate::oracle::{ProofBlob, PublicSignals};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How the mock answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockVerifierMode {
    /// Accept blobs produced by [`crate::oracle::MockProofOracle`] for these
    /// exact signals; reject anything else.
    Accept,
    /// Accept every call.
    AcceptAny,
    /// Reject every call.
    Reject,
    /// Fail every call with `Unreachable`.
    Unreachable,
    /// Never resolve.
    Stall,
    /// Behave like `Accept` after sleeping.
    Delay(Duration),
}

impl MockVerifierMode {
    fn tag(self) -> u8 {
        match self {
            MockVerifierMode::Accept => 0,
            MockVerifierMode::AcceptAny => 1,
            MockVerifierMode::Reject => 2,
            MockVerifierMode::Unreachable => 3,
            MockVerifierMode::Stall => 4,
            MockVerifierMode::Delay(_) => 5,
        }
    }
}

/// Mock verification service.
#[derive(Clone)]
pub struct MockVerificationService {
    state: Arc<MockState>,
}

struct MockState {
    mode: AtomicU8,
    delay_ms: AtomicU64,
    unreachable_next: AtomicU32,
    calls: AtomicU32,
}

impl MockVerificationService {
    /// Create new mock service.
    pub fn new(mode: MockVerifierMode) -> Self {
        let service = Self {
            state: Arc::new(MockState {
                mode: AtomicU8::new(0),
                delay_ms: AtomicU64::new(0),
                unreachable_next: AtomicU32::new(0),
                calls: AtomicU32::new(0),
            }),
        };
        service.set_mode(mode);
        service
    }

    pub fn set_mode(&self, mode: MockVerifierMode) {
        if let MockVerifierMode::Delay(delay) = mode {
            self.state
                .delay_ms
                .store(delay.as_millis() as u64, Ordering::SeqCst);
        }
        self.state.mode.store(mode.tag(), Ordering::SeqCst);
    }

    pub fn mode(&self) -> MockVerifierMode {
        match self.state.mode.load(Ordering::SeqCst) {
            0 => MockVerifierMode::Accept,
            1 => MockVerifierMode::AcceptAny,
            2 => MockVerifierMode::Reject,
            3 => MockVerifierMode::Unreachable,
            4 => MockVerifierMode::Stall,
            _ => MockVerifierMode::Delay(Duration::from_millis(
                self.state.delay_ms.load(Ordering::SeqCst),
            )),
        }
    }

    /// The next `count` calls fail with `Unreachable` regardless of mode.
    pub fn unreachable_next(&self, count: u32) {
        self.state.unreachable_next.store(count, Ordering::SeqCst);
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    fn attest(proof: &ProofBlob) -> Attestation {
        let digest = Sha256::digest(proof.as_bytes());
        Attestation {
            id: format!("mock-{}", hex::encode(&digest[..8])),
            payload: digest.to_vec(),
        }
    }

    fn check(proof: &ProofBlob, signals: &PublicSignals) -> VerificationOutcome {
        if transcript_matches(proof, signals) {
            VerificationOutcome::accepted(Some(Self::attest(proof)))
        } else {
            VerificationOutcome::rejected()
        }
    }
}

impl Default for MockVerificationService {
    fn default() -> Self {
        Self::new(MockVerifierMode::Accept)
    }
}

#[async_trait]
impl VerificationService for MockVerificationService {
    async fn verify(
        &self,
        proof: &ProofBlob,
        signals: &PublicSignals,
    ) -> Result<VerificationOutcome, VerificationError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);

        let unreachable = self
            .state
            .unreachable_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if unreachable {
            return Err(VerificationError::Unreachable(
                "mock service unreachable".to_string(),
            ));
        }

        match self.mode() {
            MockVerifierMode::Accept => Ok(Self::check(proof, signals)),
            MockVerifierMode::AcceptAny => Ok(VerificationOutcome::accepted(Some(Self::attest(
                proof,
            )))),
            MockVerifierMode::Reject => Ok(VerificationOutcome::rejected()),
            MockVerifierMode::Unreachable => Err(VerificationError::Unreachable(
                "mock service unreachable".to_string(),
            )),
            MockVerifierMode::Stall => futures::future::pending().await,
            MockVerifierMode::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Self::check(proof, signals))
            }
        }
    }
}
