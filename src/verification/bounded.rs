//! Timeout and retry wrapper around a verification service.

use super::traits::{VerificationOutcome, VerificationService};
use crate::error::VerificationError;
use crate::oracle::{ProofBlob, PublicSignals};
use crate::retry::{retry_with_backoff, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Bounds every call to the inner service by `timeout` and retries
/// `Unreachable` failures per `retry`.
///
/// A timed-out attempt is not retried: the service may still be working on
/// it, and the caller decides whether to resubmit.
#[derive(Clone)]
pub struct BoundedVerifier {
    inner: Arc<dyn VerificationService>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl BoundedVerifier {
    pub fn new(inner: Arc<dyn VerificationService>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            retry,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        &self,
        proof: &ProofBlob,
        signals: &PublicSignals,
    ) -> Result<VerificationOutcome, VerificationError> {
        match timeout(self.timeout, self.inner.verify(proof, signals)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "verification timed out");
                Err(VerificationError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl VerificationService for BoundedVerifier {
    async fn verify(
        &self,
        proof: &ProofBlob,
        signals: &PublicSignals,
    ) -> Result<VerificationOutcome, VerificationError> {
        debug!(proof_bytes = proof.len(), "submitting proof for verification");
        retry_with_backoff(
            &self.retry,
            "verify",
            || self.attempt(proof, signals),
            VerificationError::is_retryable,
        )
        .await
    }
}
