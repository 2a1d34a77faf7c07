use zkballot::config::PollConfig;
use zkballot::hasher::Sha256FieldHasher;
use zkballot::merkle::{MerkleProof, MerkleTree};
use zkballot::poll::build_tree;
use zkballot::registry::VoterRegistry;

fn membership_proof(
    config: &PollConfig,
    voter: Option<&str>,
    index: Option<i64>,
) -> Result<(MerkleTree, MerkleProof), Box<dyn std::error::Error>> {
    let mut registry = VoterRegistry::load(&config.poll.registry_path)?;
    let tree = build_tree(&mut registry, config.padding(), &Sha256FieldHasher)?;

    let leaf = match (voter, index) {
        (Some(voter), _) => registry.index_of(voter)?,
        (None, Some(index)) => tree.checked_index(index)?,
        (None, None) => return Err("either --voter or --index is required".into()),
    };
    let proof = tree.proof(leaf)?;
    Ok((tree, proof))
}

/// Print a membership proof as JSON.
pub fn execute(
    config: &PollConfig,
    voter: Option<String>,
    index: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tree, proof) = membership_proof(config, voter.as_deref(), index)?;

    let output = serde_json::json!({
        "votingID": tree.root(),
        "proof": proof,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PollConfig) {
        let temp_dir = TempDir::new().unwrap();
        let config = PollConfig::new(temp_dir.path());
        fs::write(
            &config.poll.registry_path,
            r#"{"voters": ["0xA", "0xB", "0xC", "0xD", "0xE"]}"#,
        )
        .unwrap();
        (temp_dir, config)
    }

    #[test]
    fn test_proof_by_voter() {
        let (_dir, config) = setup();
        let (tree, proof) = membership_proof(&config, Some("0xc"), None).unwrap();
        assert_eq!(proof.leaf_index(), 2);
        assert!(tree.verify(&proof, &Sha256FieldHasher));
    }

    #[test]
    fn test_proof_by_padding_index() {
        let (_dir, config) = setup();
        let (tree, proof) = membership_proof(&config, None, Some(7)).unwrap();
        assert_eq!(tree.leaf_count(), 8);
        assert!(tree.verify(&proof, &Sha256FieldHasher));
    }

    #[test]
    fn test_proof_errors() {
        let (_dir, config) = setup();
        assert!(membership_proof(&config, Some("0xF"), None).is_err());
        assert!(membership_proof(&config, None, Some(8)).is_err());
        assert!(membership_proof(&config, None, Some(-1)).is_err());
        assert!(execute(&config, Some("0xA".to_string()), None).is_ok());
    }
}
