//! Voting ledger - tally, spent nullifiers and the bound voting ID
//!
//! ## State machine
//!
//! | State | `record_vote` | Transitions |
//! |-------|---------------|-------------|
//! | **Open** | allowed | `close()` → Closed |
//! | **Closed** | `LedgerClosed` | `reset()` → Open (unbound) |
//!
//! ## Atomicity
//!
//! `record_vote` runs its root check, nullifier check, tally increment,
//! nullifier insertion and durable write under one lock. If the write fails
//! the in-memory mutation is undone before the lock is released, so memory
//! and disk never disagree and no partial update is observable.

pub mod snapshot;
pub mod store;
pub mod voting_ledger;

pub use snapshot::LedgerSnapshot;
pub use store::{JsonFileStore, LedgerStore, MemoryLedgerStore};
pub use voting_ledger::VotingLedger;

use serde::{Deserialize, Serialize};

/// Lifecycle of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    Open,
    Closed,
}

impl LedgerState {
    pub fn accepts_votes(&self) -> bool {
        matches!(self, LedgerState::Open)
    }
}
