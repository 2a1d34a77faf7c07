//! zkballot - anonymous one-vote-per-voter polls
//!
//! A voter registry is committed to a Merkle tree whose root becomes the
//! poll's voting ID. Each voter proves membership in zero knowledge, binds
//! their vote with a hiding commitment and spends a per-poll nullifier. The
//! ledger counts a vote only after the proof is verified and only once per
//! nullifier.
//!
//! Key principles:
//! - The ledger never mutates before verification accepts
//! - Nullifier check and tally update are one atomic, durable step
//! - Prover and verifier are opaque collaborators behind async traits

pub mod commitment;
pub mod config;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod merkle;
pub mod oracle;
pub mod poll;
pub mod registry;
pub mod retry;
pub mod serialization;
pub mod types;
pub mod verification;
