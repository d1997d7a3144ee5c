//! JSON-file-backed DocumentStore.
//!
//! Keeps the whole store in an [`InMemoryDocumentStore`] and rewrites a single
//! snapshot file on every write. A write is applied to a staged copy first;
//! the live contents only change once the new snapshot is on disk. Suitable
//! for the CLI and for local development, not for concurrent processes sharing
//! one file.

use crate::memory_store::{InMemoryDocumentStore, Snapshot};
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use monologue_core::config::TransactionConfig;
use monologue_core::error::{MonologueError, Result};
use monologue_core::store::{Document, DocumentStore, Transaction};
use monologue_core::StoreError;
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Durable single-file document store.
///
/// File layout:
/// ```text
/// {
///   "User": { "alice@x.com": { "nickname": "alice", ... } },
///   "Memo": { "<memo-id>": { "email": "alice@x.com", ... } }
/// }
/// ```
pub struct JsonFileDocumentStore {
    inner: InMemoryDocumentStore,
    path: PathBuf,
    retry: TransactionConfig,
    /// Serializes stage + persist + swap so snapshots reach disk in write order.
    write_lock: Mutex<()>,
}

impl JsonFileDocumentStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>, retry: TransactionConfig) -> Result<Self> {
        let path = path.into();
        let snapshot = AtomicJsonFile::<Snapshot>::new(path.clone())
            .load()
            .map_err(|e| {
                MonologueError::io(format!(
                    "Failed to load store snapshot {}: {}",
                    path.display(),
                    e
                ))
            })?
            .unwrap_or_default();

        tracing::debug!(
            path = %path.display(),
            collections = snapshot.len(),
            "Opened JSON document store"
        );

        Ok(Self {
            inner: InMemoryDocumentStore::from_snapshot(snapshot, retry.clone()),
            path,
            retry,
            write_lock: Mutex::new(()),
        })
    }

    /// A scratch copy of the live contents to apply one write to.
    async fn stage(&self) -> InMemoryDocumentStore {
        InMemoryDocumentStore::from_snapshot(self.inner.snapshot().await, self.retry.clone())
    }

    /// Writes the staged contents to disk, then makes them live.
    ///
    /// On failure the live contents are left exactly as they were.
    async fn publish(&self, staged: InMemoryDocumentStore) -> std::result::Result<(), StoreError> {
        let snapshot = staged.snapshot().await;
        let path = self.path.clone();

        let (snapshot, saved) = tokio::task::spawn_blocking(move || {
            let saved = AtomicJsonFile::<Snapshot>::new(path).save(&snapshot);
            (snapshot, saved)
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("Persist task failed: {}", e)))?;

        if let Err(e) = saved {
            tracing::warn!(path = %self.path.display(), error = %e, "Snapshot write failed");
            return Err(StoreError::unavailable(format!(
                "Failed to write snapshot: {}",
                e
            )));
        }

        self.inner.restore(snapshot).await;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get(
        &self,
        collection: &str,
        key: &str,
    ) -> std::result::Result<Option<Document>, StoreError> {
        self.inner.get(collection, key).await
    }

    async fn set(
        &self,
        collection: &str,
        key: &str,
        document: Document,
    ) -> std::result::Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage().await;
        staged.set(collection, key, document).await?;
        self.publish(staged).await
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        document: Document,
    ) -> std::result::Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage().await;
        staged.merge(collection, key, document).await?;
        self.publish(staged).await
    }

    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> std::result::Result<Vec<(String, Document)>, StoreError> {
        self.inner.get_many(collection, keys).await
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> std::result::Result<Vec<(String, Document)>, StoreError> {
        self.inner.query_eq(collection, field, value).await
    }

    async fn commit(&self, transaction: Transaction) -> std::result::Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage().await;
        staged.commit(transaction).await?;
        self.publish(staged).await
    }

    fn max_batch_keys(&self) -> usize {
        self.inner.max_batch_keys()
    }
}
