//! Membership proofs.

use super::MerkleError;
use crate::hasher::FieldHasher;
use crate::types::FieldElement;
use serde::{Deserialize, Serialize};

/// Which child the running node is at a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Node is the left child (bit 0).
    Left,
    /// Node is the right child (bit 1).
    Right,
}

impl Direction {
    pub fn bit(self) -> u8 {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
        }
    }

    pub fn from_bit(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Direction::Left),
            1 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Merkle membership proof for one leaf.
///
/// `lemma` is `[leaf_hash, sibling_0, ..., sibling_{d-1}, root]`; `directions`
/// has one entry per level, leaf first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProofRepr", into = "ProofRepr")]
pub struct MerkleProof {
    leaf_index: usize,
    directions: Vec<Direction>,
    lemma: Vec<FieldElement>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofRepr {
    leaf_index: usize,
    path: Vec<u8>,
    lemma: Vec<FieldElement>,
}

impl MerkleProof {
    /// Assemble a proof, checking its shape.
    ///
    /// The lemma must hold exactly `directions.len() + 2` entries and the
    /// direction bits must spell out `leaf_index`, least significant first.
    pub fn new(
        leaf_index: usize,
        directions: Vec<Direction>,
        lemma: Vec<FieldElement>,
    ) -> Result<Self, MerkleError> {
        if lemma.len() != directions.len() + 2 {
            return Err(MerkleError::MalformedProof(format!(
                "lemma has {} entries, expected {}",
                lemma.len(),
                directions.len() + 2
            )));
        }

        let depth = directions.len();
        let fits = depth >= usize::BITS as usize || leaf_index >> depth == 0;
        let bits_match = directions
            .iter()
            .enumerate()
            .all(|(level, d)| ((leaf_index >> level) & 1) as u8 == d.bit());
        if !fits || !bits_match {
            return Err(MerkleError::MalformedProof(format!(
                "direction bits do not encode leaf index {leaf_index}"
            )));
        }

        Ok(Self {
            leaf_index,
            directions,
            lemma,
        })
    }

    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Direction bits as the circuit consumes them.
    pub fn path_bits(&self) -> Vec<u8> {
        self.directions.iter().map(|d| d.bit()).collect()
    }

    pub fn lemma(&self) -> &[FieldElement] {
        &self.lemma
    }

    pub fn depth(&self) -> usize {
        self.directions.len()
    }

    pub fn leaf_hash(&self) -> FieldElement {
        self.lemma[0]
    }

    /// Sibling hashes, leaf level first.
    pub fn siblings(&self) -> &[FieldElement] {
        &self.lemma[1..self.lemma.len() - 1]
    }

    /// The root the proof was issued against.
    pub fn claimed_root(&self) -> FieldElement {
        self.lemma[self.lemma.len() - 1]
    }

    /// Fold from the leaf hash upward.
    pub fn recompute_root<H>(&self, hasher: &H) -> FieldElement
    where
        H: FieldHasher + ?Sized,
    {
        self.directions
            .iter()
            .zip(self.siblings())
            .fold(self.leaf_hash(), |current, (direction, sibling)| {
                match direction {
                    Direction::Left => hasher.hash_two(&current, sibling),
                    Direction::Right => hasher.hash_two(sibling, &current),
                }
            })
    }
}

impl TryFrom<ProofRepr> for MerkleProof {
    type Error = MerkleError;

    fn try_from(repr: ProofRepr) -> Result<Self, Self::Error> {
        let directions = repr
            .path
            .iter()
            .map(|bit| {
                Direction::from_bit(*bit)
                    .ok_or_else(|| MerkleError::MalformedProof(format!("invalid path bit {bit}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        MerkleProof::new(repr.leaf_index, directions, repr.lemma)
    }
}

impl From<MerkleProof> for ProofRepr {
    fn from(proof: MerkleProof) -> Self {
        ProofRepr {
            leaf_index: proof.leaf_index,
            path: proof.path_bits(),
            lemma: proof.lemma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256FieldHasher;
    use crate::merkle::MerkleTree;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_new_rejects_short_lemma() {
        let result = MerkleProof::new(0, vec![Direction::Left], vec![fe(1), fe(2)]);
        assert!(matches!(result, Err(MerkleError::MalformedProof(_))));
    }

    #[test]
    fn test_new_rejects_bits_not_matching_index() {
        let result = MerkleProof::new(
            1,
            vec![Direction::Left, Direction::Left],
            vec![fe(1), fe(2), fe(3), fe(4)],
        );
        assert!(matches!(result, Err(MerkleError::MalformedProof(_))));

        // index too large for the depth
        let result = MerkleProof::new(4, vec![Direction::Left], vec![fe(1), fe(2), fe(3)]);
        assert!(matches!(result, Err(MerkleError::MalformedProof(_))));
    }

    #[test]
    fn test_tampered_sibling_changes_root() {
        let h = Sha256FieldHasher;
        let leaves: Vec<_> = (0..4).map(fe).collect();
        let tree = MerkleTree::build(&leaves, &h).unwrap();
        let proof = tree.proof(2).unwrap();

        let mut lemma = proof.lemma().to_vec();
        lemma[1] = fe(12345);
        let forged = MerkleProof::new(2, proof.directions().to_vec(), lemma).unwrap();

        assert_ne!(forged.recompute_root(&h), tree.root());
        assert!(!tree.verify(&forged, &h));
    }

    #[test]
    fn test_json_shape_and_validation() {
        let h = Sha256FieldHasher;
        let leaves: Vec<_> = (0..4).map(fe).collect();
        let tree = MerkleTree::build(&leaves, &h).unwrap();
        let proof = tree.proof(3).unwrap();

        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["leafIndex"], 3);
        assert_eq!(json["path"], serde_json::json!([1, 1]));
        assert_eq!(json["lemma"].as_array().unwrap().len(), 4);

        let back: MerkleProof = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, proof);

        let mut bad = json;
        bad["path"] = serde_json::json!([1, 2]);
        assert!(serde_json::from_value::<MerkleProof>(bad).is_err());
    }
}
