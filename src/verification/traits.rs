//! Trait abstraction for the verification service.

use crate::error::VerificationError;
use crate::oracle::{ProofBlob, PublicSignals};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Receipt from the service, relayed to the caller as-is.
///
/// `payload` may hold a secondary proof of inclusion (leaf count, leaf index,
/// path) for a downstream contract call. It is never parsed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub id: String,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

/// Result of a completed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub accepted: bool,
    pub attestation: Option<Attestation>,
}

impl VerificationOutcome {
    pub fn accepted(attestation: Option<Attestation>) -> Self {
        Self {
            accepted: true,
            attestation,
        }
    }

    pub fn rejected() -> Self {
        Self {
            accepted: false,
            attestation: None,
        }
    }
}

/// Verifies a proof against its public signals with a trusted key.
///
/// Dropping the returned future cancels the call.
#[async_trait]
pub trait VerificationService: Send + Sync {
    async fn verify(
        &self,
        proof: &ProofBlob,
        signals: &PublicSignals,
    ) -> Result<VerificationOutcome, VerificationError>;
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(de::Error::custom)
    }
}
