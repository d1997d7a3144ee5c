//! In-memory DocumentStore with optimistic transactions.
//!
//! Every document carries a version that is bumped on each write. A
//! transaction reads the versions of the documents it touches, computes the
//! new contents without holding the lock, and only applies them if none of
//! those versions moved in the meantime. Otherwise it backs off and retries,
//! which is how managed document databases resolve conflicting transactions.

use async_trait::async_trait;
use monologue_core::config::TransactionConfig;
use monologue_core::store::{DEFAULT_MAX_BATCH_KEYS, Document, DocumentStore, Transaction};
use monologue_core::StoreError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Plain contents of a store, collection name -> key -> document.
pub type Snapshot = BTreeMap<String, BTreeMap<String, Document>>;

#[derive(Debug, Clone)]
struct StoredDocument {
    version: u64,
    fields: Document,
}

const MAX_BACKOFF: Duration = Duration::from_secs(1);

type Collections = HashMap<String, BTreeMap<String, StoredDocument>>;
type DocumentKey = (String, String);

/// Thread-safe in-memory document store.
///
/// Also the test double for the external database: failures and transaction
/// conflicts can be injected, and membership queries are counted.
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
    retry: TransactionConfig,
    max_batch_keys: usize,
    pending_failures: Mutex<Vec<StoreError>>,
    injected_conflicts: AtomicU32,
    membership_queries: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Creates an empty store with the default retry policy.
    pub fn new() -> Self {
        Self::with_config(TransactionConfig::default())
    }

    pub fn with_config(retry: TransactionConfig) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            retry,
            max_batch_keys: DEFAULT_MAX_BATCH_KEYS,
            pending_failures: Mutex::new(Vec::new()),
            injected_conflicts: AtomicU32::new(0),
            membership_queries: AtomicUsize::new(0),
        }
    }

    /// Overrides the membership query key limit.
    pub fn with_max_batch_keys(mut self, max_batch_keys: usize) -> Self {
        self.max_batch_keys = max_batch_keys.max(1);
        self
    }

    /// Creates a store pre-populated with `snapshot`.
    pub fn from_snapshot(snapshot: Snapshot, retry: TransactionConfig) -> Self {
        let collections = snapshot
            .into_iter()
            .map(|(name, documents)| {
                let documents = documents
                    .into_iter()
                    .map(|(key, fields)| (key, StoredDocument { version: 1, fields }))
                    .collect();
                (name, documents)
            })
            .collect();

        Self {
            collections: RwLock::new(collections),
            ..Self::with_config(retry)
        }
    }

    /// Copies the current contents out of the store.
    pub async fn snapshot(&self) -> Snapshot {
        let collections = self.collections.read().await;
        collections
            .iter()
            .map(|(name, documents)| {
                let documents = documents
                    .iter()
                    .map(|(key, stored)| (key.clone(), stored.fields.clone()))
                    .collect();
                (name.clone(), documents)
            })
            .collect()
    }

    /// Replaces the whole contents with `snapshot`.
    ///
    /// Surviving documents get a version newer than the one they had, so a
    /// transaction staged against the old contents cannot apply.
    pub async fn restore(&self, snapshot: Snapshot) {
        let mut collections = self.collections.write().await;
        let restored: Collections = snapshot
            .into_iter()
            .map(|(name, documents)| {
                let previous = collections.get(&name);
                let documents = documents
                    .into_iter()
                    .map(|(key, fields)| {
                        let version = previous
                            .and_then(|documents| documents.get(&key))
                            .map_or(0, |stored| stored.version);
                        (
                            key,
                            StoredDocument {
                                version: version + 1,
                                fields,
                            },
                        )
                    })
                    .collect();
                (name, documents)
            })
            .collect();
        *collections = restored;
    }

    // ============================================================================
    // Fault injection
    // ============================================================================

    /// Makes the next store call fail with `error`. Queued errors are
    /// returned in the order they were queued.
    pub async fn fail_next(&self, error: StoreError) {
        self.pending_failures.lock().await.insert(0, error);
    }

    /// Simulates `count` concurrent writers, each invalidating one transaction
    /// attempt between its read and its commit.
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.fetch_add(count, Ordering::SeqCst);
    }

    /// Number of `get_many` calls that reached the store.
    pub fn membership_query_count(&self) -> usize {
        self.membership_queries.load(Ordering::SeqCst)
    }

    async fn check_fault(&self) -> Result<(), StoreError> {
        match self.pending_failures.lock().await.pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    // ============================================================================
    // Transaction phases
    // ============================================================================

    /// Reads the touched documents and stages the updated copies.
    async fn stage(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<(DocumentKey, u64, Document)>, StoreError> {
        let collections = self.collections.read().await;
        let mut staged = Vec::new();
        for (collection, key) in transaction.document_keys() {
            let stored = collections
                .get(&collection)
                .and_then(|documents| documents.get(&key))
                .ok_or_else(|| StoreError::document_missing(&collection, &key))?;
            staged.push(((collection, key), stored.version, stored.fields.clone()));
        }
        drop(collections);

        for update in transaction.updates() {
            if let Some((_, _, fields)) = staged
                .iter_mut()
                .find(|((c, k), _, _)| *c == update.collection && *k == update.key)
            {
                update.apply_to(fields);
            }
        }
        Ok(staged)
    }

    /// Applies staged documents if no version moved. Returns false on conflict.
    async fn try_apply(&self, staged: Vec<(DocumentKey, u64, Document)>) -> bool {
        let mut collections = self.collections.write().await;
        let unchanged = staged.iter().all(|((collection, key), version, _)| {
            collections
                .get(collection)
                .and_then(|documents| documents.get(key))
                .is_some_and(|stored| stored.version == *version)
        });
        if !unchanged {
            return false;
        }

        for ((collection, key), version, fields) in staged {
            collections.entry(collection).or_default().insert(
                key,
                StoredDocument {
                    version: version + 1,
                    fields,
                },
            );
        }
        true
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        self.check_fault().await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(key))
            .map(|stored| stored.fields.clone()))
    }

    async fn set(&self, collection: &str, key: &str, document: Document) -> Result<(), StoreError> {
        self.check_fault().await?;
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        let version = documents.get(key).map_or(0, |stored| stored.version);
        documents.insert(
            key.to_string(),
            StoredDocument {
                version: version + 1,
                fields: document,
            },
        );
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        self.check_fault().await?;
        let mut collections = self.collections.write().await;
        let stored = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(|| StoredDocument {
                version: 0,
                fields: Document::new(),
            });
        stored.fields.extend(document);
        stored.version += 1;
        Ok(())
    }

    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.check_fault().await?;
        self.membership_queries.fetch_add(1, Ordering::SeqCst);

        if keys.len() > self.max_batch_keys {
            return Err(StoreError::BatchTooLarge {
                requested: keys.len(),
                max: self.max_batch_keys,
            });
        }
        let distinct: HashSet<&String> = keys.iter().collect();
        if distinct.len() != keys.len() {
            return Err(StoreError::InvalidQuery(
                "membership filter contains duplicate values".to_string(),
            ));
        }

        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .filter(|(key, _)| distinct.contains(key))
            .map(|(key, stored)| (key.clone(), stored.fields.clone()))
            .collect())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.check_fault().await?;
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .filter(|(_, stored)| stored.fields.get(field) == Some(value))
            .map(|(key, stored)| (key.clone(), stored.fields.clone()))
            .collect())
    }

    async fn commit(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.check_fault().await?;
        if transaction.is_empty() {
            return Ok(());
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = Duration::from_millis(self.retry.initial_backoff_ms).min(MAX_BACKOFF);

        for attempt in 1..=max_attempts {
            let staged = self.stage(&transaction).await?;

            let committed = !self.take_injected_conflict() && self.try_apply(staged).await;
            if committed {
                tracing::debug!(
                    attempt,
                    documents = transaction.document_keys().len(),
                    "Transaction committed"
                );
                return Ok(());
            }

            tracing::warn!(attempt, max_attempts, "Transaction conflict");
            if attempt < max_attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }

        Err(StoreError::TransactionConflict {
            attempts: max_attempts,
        })
    }

    fn max_batch_keys(&self) -> usize {
        self.max_batch_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    fn fast_retry(max_attempts: u32) -> TransactionConfig {
        TransactionConfig {
            max_attempts,
            initial_backoff_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryDocumentStore::new();
        store
            .set("User", "a@x.com", doc(json!({ "nickname": "a" })))
            .await
            .unwrap();

        let found = store.get("User", "a@x.com").await.unwrap().unwrap();
        assert_eq!(found["nickname"], json!("a"));
        assert!(store.get("User", "b@x.com").await.unwrap().is_none());
        assert!(store.get("Other", "a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let store = InMemoryDocumentStore::new();
        store
            .set("User", "a@x.com", doc(json!({ "nickname": "a", "introduction": "hi" })))
            .await
            .unwrap();
        store
            .set("User", "a@x.com", doc(json!({ "nickname": "b" })))
            .await
            .unwrap();

        let found = store.get("User", "a@x.com").await.unwrap().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["nickname"], json!("b"));
    }

    #[tokio::test]
    async fn test_merge_keeps_unmentioned_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .set("User", "a@x.com", doc(json!({ "nickname": "a", "introduction": "hi" })))
            .await
            .unwrap();
        store
            .merge("User", "a@x.com", doc(json!({ "nickname": "b" })))
            .await
            .unwrap();

        let found = store.get("User", "a@x.com").await.unwrap().unwrap();
        assert_eq!(found["nickname"], json!("b"));
        assert_eq!(found["introduction"], json!("hi"));
    }

    #[tokio::test]
    async fn test_get_many_limits() {
        let store = InMemoryDocumentStore::new().with_max_batch_keys(2);
        store.set("User", "a@x.com", Document::new()).await.unwrap();
        store.set("User", "b@x.com", Document::new()).await.unwrap();

        let keys = vec!["a@x.com".to_string(), "z@x.com".to_string()];
        let found = store.get_many("User", &keys).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "a@x.com");

        let too_many: Vec<String> = ["a", "b", "c"].iter().map(|k| format!("{k}@x.com")).collect();
        assert_eq!(
            store.get_many("User", &too_many).await,
            Err(StoreError::BatchTooLarge {
                requested: 3,
                max: 2
            })
        );

        let duplicated = vec!["a@x.com".to_string(), "a@x.com".to_string()];
        assert!(matches!(
            store.get_many("User", &duplicated).await,
            Err(StoreError::InvalidQuery(_))
        ));
        assert_eq!(store.membership_query_count(), 3);
    }

    #[tokio::test]
    async fn test_query_eq() {
        let store = InMemoryDocumentStore::new();
        store
            .set("Memo", "m1", doc(json!({ "email": "a@x.com" })))
            .await
            .unwrap();
        store
            .set("Memo", "m2", doc(json!({ "email": "b@x.com" })))
            .await
            .unwrap();
        store
            .set("Memo", "m3", doc(json!({ "email": "a@x.com" })))
            .await
            .unwrap();

        let found = store
            .query_eq("Memo", "email", &json!("a@x.com"))
            .await
            .unwrap();
        let keys: Vec<_> = found.into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["m1", "m3"]);
    }

    #[tokio::test]
    async fn test_commit_applies_all_updates() {
        let store = InMemoryDocumentStore::new();
        store.set("User", "a@x.com", Document::new()).await.unwrap();
        store.set("User", "b@x.com", Document::new()).await.unwrap();

        let tx = Transaction::new()
            .array_union("User", "a@x.com", "followings", ["b@x.com"])
            .array_union("User", "b@x.com", "followers", ["a@x.com"]);
        store.commit(tx).await.unwrap();

        let a = store.get("User", "a@x.com").await.unwrap().unwrap();
        let b = store.get("User", "b@x.com").await.unwrap().unwrap();
        assert_eq!(a["followings"], json!(["b@x.com"]));
        assert_eq!(b["followers"], json!(["a@x.com"]));
    }

    #[tokio::test]
    async fn test_commit_with_missing_document_writes_nothing() {
        let store = InMemoryDocumentStore::new();
        store.set("User", "a@x.com", Document::new()).await.unwrap();

        let tx = Transaction::new()
            .array_union("User", "a@x.com", "followings", ["ghost@x.com"])
            .array_union("User", "ghost@x.com", "followers", ["a@x.com"]);
        let result = store.commit(tx).await;

        assert_eq!(
            result,
            Err(StoreError::document_missing("User", "ghost@x.com"))
        );
        let a = store.get("User", "a@x.com").await.unwrap().unwrap();
        assert!(!a.contains_key("followings"));
        assert!(store.get("User", "ghost@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_retries_injected_conflicts() {
        let store = InMemoryDocumentStore::with_config(fast_retry(3));
        store.set("User", "a@x.com", Document::new()).await.unwrap();
        store.inject_conflicts(2);

        let tx = Transaction::new().array_union("User", "a@x.com", "likes", ["p1"]);
        store.commit(tx).await.unwrap();

        let a = store.get("User", "a@x.com").await.unwrap().unwrap();
        assert_eq!(a["likes"], json!(["p1"]));
    }

    #[tokio::test]
    async fn test_commit_gives_up_after_max_attempts() {
        let store = InMemoryDocumentStore::with_config(fast_retry(2));
        store.set("User", "a@x.com", Document::new()).await.unwrap();
        store.inject_conflicts(2);

        let tx = Transaction::new().array_union("User", "a@x.com", "likes", ["p1"]);
        assert_eq!(
            store.commit(tx).await,
            Err(StoreError::TransactionConflict { attempts: 2 })
        );

        let a = store.get("User", "a@x.com").await.unwrap().unwrap();
        assert!(!a.contains_key("likes"));
    }

    #[tokio::test]
    async fn test_fail_next_is_consumed_once() {
        let store = InMemoryDocumentStore::new();
        store.fail_next(StoreError::unavailable("offline")).await;

        assert_eq!(
            store.get("User", "a@x.com").await,
            Err(StoreError::unavailable("offline"))
        );
        assert_eq!(store.get("User", "a@x.com").await, Ok(None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_unions_are_not_lost() {
        let store = Arc::new(InMemoryDocumentStore::with_config(TransactionConfig {
            max_attempts: 50,
            initial_backoff_ms: 1,
        }));
        store.set("User", "hub@x.com", Document::new()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let tx = Transaction::new().array_union(
                    "User",
                    "hub@x.com",
                    "followers",
                    [format!("user{i}@x.com")],
                );
                store.commit(tx).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let hub = store.get("User", "hub@x.com").await.unwrap().unwrap();
        assert_eq!(hub["followers"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_restore_replaces_contents_and_bumps_versions() {
        let store = InMemoryDocumentStore::new();
        store
            .set("User", "a@x.com", doc(json!({ "nickname": "a" })))
            .await
            .unwrap();
        let before = store.snapshot().await;
        store.set("User", "b@x.com", Document::new()).await.unwrap();

        let tx = Transaction::new().array_union("User", "a@x.com", "likes", ["p1"]);
        let staged = store.stage(&tx).await.unwrap();
        store.restore(before).await;

        assert!(store.get("User", "b@x.com").await.unwrap().is_none());
        assert_eq!(
            store.get("User", "a@x.com").await.unwrap().unwrap()["nickname"],
            json!("a")
        );
        // Staged against the pre-restore version
        assert!(!store.try_apply(staged).await);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let store = InMemoryDocumentStore::new();
        store
            .set("User", "a@x.com", doc(json!({ "nickname": "a" })))
            .await
            .unwrap();

        let restored =
            InMemoryDocumentStore::from_snapshot(store.snapshot().await, TransactionConfig::default());
        let found = restored.get("User", "a@x.com").await.unwrap().unwrap();
        assert_eq!(found["nickname"], json!("a"));
    }
}
