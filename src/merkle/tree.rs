//! Tree construction and proof extraction.

use super::proof::{Direction, MerkleProof};
use super::MerkleError;
use crate::hasher::FieldHasher;
use crate::types::FieldElement;

/// An immutable Merkle tree with every level kept in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    leaves: Vec<FieldElement>,
    /// `levels[0]` are leaf hashes, the last level is `[root]`.
    levels: Vec<Vec<FieldElement>>,
}

impl MerkleTree {
    /// Build a tree over already-padded leaves.
    ///
    /// The leaf count must be a power of two; padding is the registry's job.
    pub fn build<H>(leaves: &[FieldElement], hasher: &H) -> Result<Self, MerkleError>
    where
        H: FieldHasher + ?Sized,
    {
        if leaves.is_empty() {
            return Err(MerkleError::Empty);
        }
        if !leaves.len().is_power_of_two() {
            return Err(MerkleError::NotPowerOfTwo {
                leaf_count: leaves.len(),
            });
        }

        Ok(Self {
            leaves: leaves.to_vec(),
            levels: hash_levels(leaves, hasher),
        })
    }

    /// The sole top-level node.
    pub fn root(&self) -> FieldElement {
        self.levels[self.depth()][0]
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaves(&self) -> &[FieldElement] {
        &self.leaves
    }

    /// Nodes at `level` (0 = leaf hashes).
    pub fn level(&self, level: usize) -> Option<&[FieldElement]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    /// Validate a signed index coming from an untrusted caller.
    pub fn checked_index(&self, index: i64) -> Result<usize, MerkleError> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.leaf_count())
            .ok_or(MerkleError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            })
    }

    /// Membership proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        if index >= self.leaf_count() {
            return Err(MerkleError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                leaf_count: self.leaf_count(),
            });
        }

        let depth = self.depth();
        let mut directions = Vec::with_capacity(depth);
        let mut lemma = Vec::with_capacity(depth + 2);
        lemma.push(self.levels[0][index]);

        let mut position = index;
        for level in &self.levels[..depth] {
            let direction = if position % 2 == 0 {
                Direction::Left
            } else {
                Direction::Right
            };
            let sibling = match direction {
                Direction::Left => position + 1,
                Direction::Right => position - 1,
            };
            // lone trailing node is its own sibling
            let sibling_hash = level.get(sibling).copied().unwrap_or(level[position]);

            directions.push(direction);
            lemma.push(sibling_hash);
            position /= 2;
        }

        lemma.push(self.root());

        MerkleProof::new(index, directions, lemma)
    }

    /// Check a proof against this tree's root.
    pub fn verify<H>(&self, proof: &MerkleProof, hasher: &H) -> bool
    where
        H: FieldHasher + ?Sized,
    {
        let root = self.root();
        proof.leaf_index() < self.leaf_count()
            && proof.depth() == self.depth()
            && proof.claimed_root() == root
            && proof.recompute_root(hasher) == root
    }
}

/// Hash leaves level by level up to a single root.
fn hash_levels<H>(leaves: &[FieldElement], hasher: &H) -> Vec<Vec<FieldElement>>
where
    H: FieldHasher + ?Sized,
{
    let mut levels = Vec::new();
    let mut current: Vec<FieldElement> = leaves.iter().map(|l| hasher.hash_one(l)).collect();

    while current.len() > 1 {
        let next = current
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                hasher.hash_two(left, right)
            })
            .collect();
        levels.push(std::mem::replace(&mut current, next));
    }

    levels.push(current);
    levels
}
