//! Merkle membership engine.
//!
//! A perfect binary tree over padded voter leaves. The tree is an immutable
//! value: it is built once from the registry snapshot and then only queried,
//! so proofs for different voters can be generated concurrently.
//!
//! ## Layout
//!
//! - Level 0 holds `leafHash(leaf)` for every leaf
//! - Level `L` position `i` is `nodeHash(level[L-1][2i], level[L-1][2i+1])`
//! - A lone trailing node on an odd-width level is paired with itself
//! - The top level holds exactly one node, the root
//!
//! ## Single-leaf trees
//!
//! A depth-0 tree has the leaf hash as its root. Its proof carries no
//! direction bits and its lemma is `[leaf_hash, root]`, both equal.

pub mod proof;
pub mod tree;

#[cfg(test)]
mod proptests;

pub use proof::{Direction, MerkleProof};
pub use tree::MerkleTree;

use thiserror::Error;

/// Tree construction and proof errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("cannot build a tree without leaves")]
    Empty,

    #[error("leaf count {leaf_count} is not a power of two; pad the registry first")]
    NotPowerOfTwo { leaf_count: usize },

    #[error("leaf index {index} out of range [0, {leaf_count})")]
    IndexOutOfRange { index: i64, leaf_count: usize },

    #[error("malformed proof: {0}")]
    MalformedProof(String),
}
