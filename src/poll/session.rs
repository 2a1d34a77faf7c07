//! A running poll.

use super::ballot::{Ballot, BallotSecret, PreparedBallot, VoteReceipt};
use crate::commitment::{Randomness, VoteCommitmentScheme};
use crate::error::{InputError, OracleError, VerificationError, VoteError};
use crate::hasher::FieldHasher;
use crate::ledger::VotingLedger;
use crate::merkle::{MerkleProof, MerkleTree};
use crate::oracle::{ProofOracle, ProofRequest};
use crate::registry::{normalize_identity, PaddingPolicy, VoterRegistry};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{Leaf, Vote, VotingId};
use crate::verification::{BoundedVerifier, VerificationService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Operator-controlled poll parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Choice labels; a vote is an index into this list.
    pub choices: Vec<String>,
    pub padding: PaddingPolicy,
    /// Proving attempts, each with fresh randomness.
    pub proving_attempts: u32,
    pub verification_timeout: Duration,
    pub verification_retry: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            choices: vec!["no".to_string(), "yes".to_string()],
            padding: PaddingPolicy::NextPowerOfTwo,
            proving_attempts: 3,
            verification_timeout: Duration::from_secs(120),
            verification_retry: RetryPolicy::default(),
        }
    }
}

/// Seal `registry`, pad it per `padding` and build the tree.
///
/// The root of the returned tree is the poll's voting ID.
pub fn build_tree(
    registry: &mut VoterRegistry,
    padding: PaddingPolicy,
    hasher: &dyn FieldHasher,
) -> Result<MerkleTree, VoteError> {
    registry.seal();
    let leaves = registry.padded_leaves(padding)?;
    Ok(MerkleTree::build(&leaves, hasher)?)
}

/// An open poll over a sealed registry.
pub struct Poll {
    settings: PollSettings,
    registry: VoterRegistry,
    tree: MerkleTree,
    voting_id: VotingId,
    hasher: Arc<dyn FieldHasher>,
    ledger: Arc<VotingLedger>,
    oracle: Arc<dyn ProofOracle>,
    verifier: BoundedVerifier,
}

impl Poll {
    /// Seal the registry, build the tree and bind the ledger to its root.
    ///
    /// Reopening against a ledger already bound to the same root resumes the
    /// poll; a ledger bound to another root fails with `VotingIdLocked`.
    pub async fn open(
        settings: PollSettings,
        mut registry: VoterRegistry,
        hasher: Arc<dyn FieldHasher>,
        ledger: Arc<VotingLedger>,
        oracle: Arc<dyn ProofOracle>,
        verifier: Arc<dyn VerificationService>,
    ) -> Result<Self, VoteError> {
        let tree = build_tree(&mut registry, settings.padding, hasher.as_ref())?;
        let voting_id = VotingId(tree.root());

        ledger.open_poll(voting_id).await?;

        info!(
            voting_id = %voting_id,
            voters = registry.len(),
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            choices = settings.choices.len(),
            "poll opened"
        );

        let verifier = BoundedVerifier::new(
            verifier,
            settings.verification_timeout,
            settings.verification_retry,
        );

        Ok(Self {
            settings,
            registry,
            tree,
            voting_id,
            hasher,
            ledger,
            oracle,
            verifier,
        })
    }

    pub fn voting_id(&self) -> VotingId {
        self.voting_id
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn registry(&self) -> &VoterRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Arc<VotingLedger> {
        &self.ledger
    }

    fn check_vote(&self, vote: Vote) -> Result<(), InputError> {
        let choices = self.settings.choices.len();
        if vote.0 >= choices as u64 {
            return Err(InputError::InvalidVote { vote, choices });
        }
        Ok(())
    }

    /// Membership proof for a registered voter.
    pub fn membership_proof(&self, identity: &str) -> Result<MerkleProof, VoteError> {
        let index = self.registry.index_of(identity)?;
        Ok(self.tree.proof(index)?)
    }

    /// Membership proof for a (possibly padded) leaf slot.
    pub fn proof_at(&self, index: i64) -> Result<MerkleProof, VoteError> {
        let index = self.tree.checked_index(index)?;
        Ok(self.tree.proof(index)?)
    }

    /// Prepare a ballot: membership proof, commitment, nullifier and a
    /// zero-knowledge proof over them.
    ///
    /// The witness is checked before the prover runs and the prover's public
    /// signals are checked after. A prover failure is retried with fresh
    /// randomness.
    pub async fn build_ballot(&self, identity: &str, vote: Vote) -> Result<PreparedBallot, VoteError> {
        self.check_vote(vote)?;
        let index = self.registry.index_of(identity)?;
        let membership = self.tree.proof(index)?;

        let hasher = self.hasher.as_ref();
        let scheme = VoteCommitmentScheme::new(hasher);
        let leaf = Leaf::from_identity(&normalize_identity(identity)).element();
        let nullifier = scheme.nullifier(&self.voting_id, identity);
        debug!(nullifier = %nullifier, leaf_index = index, "preparing ballot");

        let policy = RetryPolicy::new(self.settings.proving_attempts, Duration::ZERO);
        let (request, proved) = retry_with_backoff(
            &policy,
            "prove",
            || {
                let randomness = Randomness::generate();
                let commitment = scheme.commit(vote, &randomness);
                let request = ProofRequest::new(
                    self.voting_id,
                    leaf,
                    &membership,
                    nullifier,
                    vote,
                    randomness,
                    commitment,
                );
                let oracle = Arc::clone(&self.oracle);
                async move {
                    request.check(hasher)?;
                    let proved = oracle.prove(&request).await?;
                    request.check_signals(&proved.public_signals)?;
                    Ok::<_, OracleError>((request, proved))
                }
            },
            OracleError::is_retryable,
        )
        .await?;

        debug!(
            nullifier = %nullifier,
            proof_bytes = proved.proof.len(),
            "ballot prepared"
        );

        Ok(PreparedBallot {
            secret: BallotSecret {
                vote,
                randomness: request.randomness.clone(),
            },
            nullifier,
            commitment: request.commitment,
            ballot: Ballot::from(proved),
        })
    }

    /// Verify a ballot and record the vote its commitment opens to.
    ///
    /// `secret` must open the commitment in the ballot's public signals. The
    /// ledger is only touched after the verification service accepts.
    pub async fn submit(&self, ballot: &Ballot, secret: &BallotSecret) -> Result<VoteReceipt, VoteError> {
        let vote = secret.vote;
        self.check_vote(vote)?;
        let signals = &ballot.public_signals;
        let voting_id = signals.voting_id()?;
        let nullifier = signals.nullifier()?;
        let commitment = signals.commitment()?;

        if !VoteCommitmentScheme::new(self.hasher.as_ref()).open(&commitment, vote, &secret.randomness) {
            warn!(nullifier = %nullifier, vote = %vote, "opening does not match commitment");
            return Err(InputError::CommitmentMismatch { vote }.into());
        }

        self.ledger.check_admissible(&voting_id, &nullifier).await?;

        let outcome = self.verifier.verify(&ballot.proof, signals).await?;
        if !outcome.accepted {
            warn!(nullifier = %nullifier, "proof rejected");
            return Err(VerificationError::Rejected.into());
        }
        debug!(
            nullifier = %nullifier,
            attestation = outcome.attestation.as_ref().map(|a| a.id.as_str()),
            "proof accepted"
        );

        self.ledger.record_vote(&voting_id, vote, &nullifier).await?;

        Ok(VoteReceipt {
            voting_id,
            nullifier,
            commitment,
            attestation: outcome.attestation,
            total_votes: self.ledger.total_votes().await,
        })
    }

    /// `build_ballot` followed by `submit`.
    pub async fn cast(&self, identity: &str, vote: Vote) -> Result<(VoteReceipt, BallotSecret), VoteError> {
        let prepared = self.build_ballot(identity, vote).await?;
        let receipt = self.submit(&prepared.ballot, &prepared.secret).await?;
        Ok((receipt, prepared.secret))
    }

    /// Tally keyed by choice label, in choice order.
    pub async fn results(&self) -> Vec<(String, u64)> {
        let tally = self.ledger.tally().await;
        self.settings
            .choices
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let count = tally.get(&Vote(i as u64)).copied().unwrap_or(0);
                (label.clone(), count)
            })
            .collect()
    }
}
