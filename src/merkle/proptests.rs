//! Property-based tests for the Merkle tree
//!
//! Tests for:
//! - Completeness: every leaf's proof folds back to the root
//! - Binding: changing any single leaf changes the root
//! - Soundness: a proof never verifies against a tree it was not issued by

use super::MerkleTree;
use crate::hasher::Sha256FieldHasher;
use crate::types::FieldElement;
use proptest::prelude::*;

fn leaf_set() -> impl Strategy<Value = Vec<FieldElement>> {
    (0u32..7).prop_flat_map(|k| {
        prop::collection::vec(any::<u64>().prop_map(FieldElement::from_u64), 1usize << k)
    })
}

proptest! {
    /// For every leaf set of size 2^k, recompute_root(proof(i)) == root for all i
    #[test]
    fn prop_completeness(leaves in leaf_set()) {
        let h = Sha256FieldHasher;
        let tree = MerkleTree::build(&leaves, &h).unwrap();

        for i in 0..tree.leaf_count() {
            let proof = tree.proof(i).unwrap();
            prop_assert_eq!(proof.recompute_root(&h), tree.root());
            prop_assert!(tree.verify(&proof, &h));
        }
    }

    /// Changing any single leaf value changes the root
    #[test]
    fn prop_single_leaf_change_changes_root(
        leaves in leaf_set(),
        pick in any::<prop::sample::Index>(),
        delta in 1u64..u64::MAX,
    ) {
        let h = Sha256FieldHasher;
        let tree = MerkleTree::build(&leaves, &h).unwrap();

        let i = pick.index(leaves.len());
        let mut changed = leaves.clone();
        let old = u64::from_be_bytes(leaves[i].as_bytes()[24..].try_into().unwrap());
        changed[i] = FieldElement::from_u64(old.wrapping_add(delta));

        let other = MerkleTree::build(&changed, &h).unwrap();
        prop_assert_ne!(tree.root(), other.root());
    }

    /// Out-of-range indices are always rejected
    #[test]
    fn prop_out_of_range_rejected(leaves in leaf_set(), extra in 0usize..100, negative in i64::MIN..0) {
        let h = Sha256FieldHasher;
        let tree = MerkleTree::build(&leaves, &h).unwrap();

        prop_assert!(tree.proof(tree.leaf_count() + extra).is_err());
        prop_assert!(tree.checked_index(negative).is_err());
    }
}
