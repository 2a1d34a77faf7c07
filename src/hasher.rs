//! Pluggable field hashing.
//!
//! The tree, the commitment scheme and the nullifier derivation all consume a
//! [`FieldHasher`]. Production deployments inject the circuit's permutation;
//! [`Sha256FieldHasher`] is the bundled default.

use crate::types::{FieldElement, FIELD_BYTES};
use sha2::{Digest, Sha256};

/// Domain tag for single-input hashing (leaves).
const TAG_ONE: u8 = 0x00;

/// Domain tag for two-input hashing (nodes, commitments, nullifiers).
const TAG_TWO: u8 = 0x01;

/// Leaf/node hashing capability.
pub trait FieldHasher: Send + Sync {
    /// `leafHash`
    fn hash_one(&self, input: &FieldElement) -> FieldElement;

    /// `nodeHash`
    fn hash_two(&self, left: &FieldElement, right: &FieldElement) -> FieldElement;
}

/// Domain-separated SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256FieldHasher;

impl Sha256FieldHasher {
    pub fn new() -> Self {
        Self
    }
}

fn finish(hasher: Sha256) -> FieldElement {
    let digest = hasher.finalize();
    let mut out = [0u8; FIELD_BYTES];
    out.copy_from_slice(&digest);
    FieldElement::from_bytes(out)
}

impl FieldHasher for Sha256FieldHasher {
    fn hash_one(&self, input: &FieldElement) -> FieldElement {
        let mut h = Sha256::new();
        h.update([TAG_ONE]);
        h.update(input.as_bytes());
        finish(h)
    }

    fn hash_two(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        let mut h = Sha256::new();
        h.update([TAG_TWO]);
        h.update(left.as_bytes());
        h.update(right.as_bytes());
        finish(h)
    }
}
