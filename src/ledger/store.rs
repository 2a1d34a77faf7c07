//! Durable storage for ledger snapshots.

use super::snapshot::LedgerSnapshot;
use crate::error::PersistenceError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Snapshot persistence.
///
/// `persist` must not return `Ok` until the snapshot survives a restart.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// `None` if nothing has been stored yet; `Corrupt` if the stored data
    /// cannot be read back.
    async fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError>;

    async fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError>;
}

/// Snapshot as a JSON file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PersistenceError::Corrupt {
                    location: self.path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        LedgerSnapshot::from_json(&contents, &self.path.display().to_string()).map(Some)
    }

    async fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        let json = snapshot.to_json()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(parent, e))?;
        }

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| self.io_error(&temp, e))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| self.io_error(&temp, e))?;
        file.sync_all().await.map_err(|e| self.io_error(&temp, e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(&self.path, e))
    }
}

/// In-memory store with failure injection, for tests.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    snapshot: Mutex<Option<LedgerSnapshot>>,
    fail_writes: AtomicBool,
    writes: AtomicU32,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, as if a previous process had written it.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                snapshot: Mutex::new(Some(snapshot)),
                ..Default::default()
            }),
        }
    }

    /// Make every subsequent `persist` fail until turned off again.
    pub fn fail_writes(&self, enabled: bool) {
        self.inner.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u32 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// What a restarted process would read.
    pub async fn stored(&self) -> Option<LedgerSnapshot> {
        self.inner.snapshot.lock().await.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        Ok(self.inner.snapshot.lock().await.clone())
    }

    async fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "injected write failure".to_string(),
            ));
        }
        *self.inner.snapshot.lock().await = Some(snapshot.clone());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldElement, Nullifier, Vote, VotingId};
    use tempfile::TempDir;

    fn sample() -> LedgerSnapshot {
        let mut snapshot = LedgerSnapshot {
            voting_id: Some(VotingId(FieldElement::from_u64(99))),
            ..Default::default()
        };
        snapshot.tally.insert(Vote(0), 1);
        snapshot
            .spent_nullifiers
            .insert(Nullifier(FieldElement::from_u64(5)));
        snapshot
    }

    #[tokio::test]
    async fn test_file_store_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("results.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("results.json"));

        store.persist(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{\"votingID\": 12").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(PersistenceError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_store_write_to_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = JsonFileStore::new(blocker.join("results.json"));
        assert!(matches!(
            store.persist(&sample()).await,
            Err(PersistenceError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryLedgerStore::new();
        store.persist(&sample()).await.unwrap();
        assert_eq!(store.writes(), 1);

        store.fail_writes(true);
        assert!(matches!(
            store.persist(&LedgerSnapshot::default()).await,
            Err(PersistenceError::Unavailable(_))
        ));
        assert_eq!(store.stored().await, Some(sample()));
        assert_eq!(store.writes(), 1);
    }
}
