//! Poll orchestration.
//!
//! Ties the registry, tree, commitment scheme, prover, verifier and ledger
//! together:
//!
//! 1. `Poll::open` seals the registry, builds the tree and binds the ledger
//!    to the root (the voting ID)
//! 2. `build_ballot` produces a membership proof, a commitment and a
//!    zero-knowledge proof for one voter
//! 3. `submit` pre-checks root and nullifier, awaits verification, then
//!    records the vote
//!
//! A failure in any step affects only the submission that hit it.

pub mod ballot;
pub mod session;

pub use ballot::{Ballot, BallotSecret, PreparedBallot, VoteReceipt};
pub use session::{build_tree, Poll, PollSettings};
