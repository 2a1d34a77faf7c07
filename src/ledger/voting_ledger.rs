//! The shared voting ledger.

use super::snapshot::LedgerSnapshot;
use super::store::LedgerStore;
use super::LedgerState;
use crate::error::{LedgerError, PersistenceError, ProtocolError};
use crate::types::{Nullifier, Vote, VotingId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Tally, spent nullifiers and voting ID behind one lock.
///
/// Every mutation is written through to the store before the lock is
/// released; on a failed write the mutation is reverted.
pub struct VotingLedger {
    state: Mutex<LedgerSnapshot>,
    store: Arc<dyn LedgerStore>,
}

impl VotingLedger {
    /// Read the persisted snapshot, or start empty if there is none.
    ///
    /// A corrupt snapshot is returned as an error; the service must not
    /// start on top of it.
    pub async fn load(store: Arc<dyn LedgerStore>) -> Result<Self, PersistenceError> {
        let snapshot = match store.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    voting_id = ?snapshot.voting_id,
                    votes = snapshot.total_votes(),
                    closed = snapshot.closed,
                    "loaded ledger snapshot"
                );
                snapshot
            }
            Ok(None) => {
                info!("no ledger snapshot found, starting empty");
                LedgerSnapshot::default()
            }
            Err(e) => {
                error!(error = %e, "ledger snapshot unreadable");
                return Err(e);
            }
        };

        Ok(Self {
            state: Mutex::new(snapshot),
            store,
        })
    }

    /// Bind the ledger to a poll's voting ID.
    ///
    /// Re-binding the same ID is a no-op; a different ID needs `reset` first.
    pub async fn open_poll(&self, voting_id: VotingId) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        if state.closed {
            return Err(ProtocolError::LedgerClosed.into());
        }
        match state.voting_id {
            Some(current) if current == voting_id => return Ok(()),
            Some(current) => {
                return Err(ProtocolError::VotingIdLocked {
                    current,
                    requested: voting_id,
                }
                .into())
            }
            None => {}
        }

        let previous = state.clone();
        state.voting_id = Some(voting_id);
        self.persist_or_restore(&mut state, previous).await?;

        info!(voting_id = %voting_id, "ledger bound to voting ID");
        Ok(())
    }

    /// Root and nullifier pre-checks, without mutation.
    pub async fn check_admissible(
        &self,
        voting_id: &VotingId,
        nullifier: &Nullifier,
    ) -> Result<(), ProtocolError> {
        let state = self.state.lock().await;
        Self::admissible(&state, voting_id, nullifier)
    }

    fn admissible(
        state: &LedgerSnapshot,
        voting_id: &VotingId,
        nullifier: &Nullifier,
    ) -> Result<(), ProtocolError> {
        if state.closed {
            return Err(ProtocolError::LedgerClosed);
        }
        if state.voting_id.as_ref() != Some(voting_id) {
            return Err(ProtocolError::RootMismatch {
                expected: state.voting_id,
                got: *voting_id,
            });
        }
        if state.spent_nullifiers.contains(nullifier) {
            return Err(ProtocolError::AlreadySpent(*nullifier));
        }
        Ok(())
    }

    /// Count one vote and spend its nullifier.
    ///
    /// The checks are repeated here under the lock: whatever passed
    /// `check_admissible` before verification may have been spent since.
    pub async fn record_vote(
        &self,
        voting_id: &VotingId,
        vote: Vote,
        nullifier: &Nullifier,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        if let Err(e) = Self::admissible(&state, voting_id, nullifier) {
            debug!(nullifier = %nullifier, error = %e, "vote not admissible");
            return Err(e.into());
        }

        state.spent_nullifiers.insert(*nullifier);
        *state.tally.entry(vote).or_insert(0) += 1;

        let snapshot = state.clone();
        if let Err(e) = self.store.persist(&snapshot).await {
            state.spent_nullifiers.remove(nullifier);
            if let Some(count) = state.tally.get_mut(&vote) {
                *count -= 1;
                if *count == 0 {
                    state.tally.remove(&vote);
                }
            }
            warn!(nullifier = %nullifier, error = %e, "ledger write failed, vote rolled back");
            return Err(e.into());
        }

        info!(
            nullifier = %nullifier,
            vote = %vote,
            total = snapshot.total_votes(),
            "vote recorded"
        );
        Ok(())
    }

    /// Stop accepting votes. Idempotent.
    pub async fn close(&self) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }

        let previous = state.clone();
        state.closed = true;
        self.persist_or_restore(&mut state, previous).await?;

        info!(votes = state.total_votes(), "ledger closed");
        Ok(())
    }

    /// Clear tally and spent set, unbind the voting ID and reopen.
    pub async fn reset(&self) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        let previous = std::mem::take(&mut *state);
        self.persist_or_restore(&mut state, previous).await?;

        info!("ledger reset");
        Ok(())
    }

    async fn persist_or_restore(
        &self,
        state: &mut LedgerSnapshot,
        previous: LedgerSnapshot,
    ) -> Result<(), PersistenceError> {
        if let Err(e) = self.store.persist(state).await {
            warn!(error = %e, "ledger write failed, state restored");
            *state = previous;
            return Err(e);
        }
        Ok(())
    }

    pub async fn tally(&self) -> BTreeMap<Vote, u64> {
        self.state.lock().await.tally.clone()
    }

    pub async fn voting_id(&self) -> Option<VotingId> {
        self.state.lock().await.voting_id
    }

    pub async fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.state.lock().await.spent_nullifiers.contains(nullifier)
    }

    pub async fn total_votes(&self) -> u64 {
        self.state.lock().await.total_votes()
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().await.clone()
    }

    pub async fn state(&self) -> LedgerState {
        self.state.lock().await.state()
    }
}
