//! Cached memo and column counts.
//!
//! Counts are loaded on first use and kept until invalidated. A load that
//! races an invalidation is returned to its caller but never cached.

use crate::follow_graph::FollowGraphService;
use monologue_core::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
enum CountKind {
    Memos,
    Columns,
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    /// Bumped by every invalidation of this email.
    generation: u64,
    memos: Option<usize>,
    columns: Option<usize>,
}

impl Entry {
    fn slot(&mut self, kind: CountKind) -> &mut Option<usize> {
        match kind {
            CountKind::Memos => &mut self.memos,
            CountKind::Columns => &mut self.columns,
        }
    }

    fn get(&self, kind: CountKind) -> Option<usize> {
        match kind {
            CountKind::Memos => self.memos,
            CountKind::Columns => self.columns,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Entry>,
    /// Bumped by every `clear`.
    epoch: u64,
}

impl CacheState {
    fn token(&self, email: &str) -> (u64, u64) {
        let generation = self.entries.get(email).map_or(0, |e| e.generation);
        (self.epoch, generation)
    }
}

/// In-memory cache of per-user memo and column counts.
///
/// Entries never expire on their own; call [`invalidate`](Self::invalidate)
/// after the user posts.
pub struct CountCache {
    service: Arc<FollowGraphService>,
    state: Arc<RwLock<CacheState>>,
}

impl CountCache {
    pub fn new(service: Arc<FollowGraphService>) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    /// Gets the memo count for `email`, loading it on a miss.
    pub async fn get_or_load_memo_count(&self, email: &str) -> Result<usize> {
        self.get_or_load(email, CountKind::Memos).await
    }

    /// Gets the column count for `email`, loading it on a miss.
    pub async fn get_or_load_column_count(&self, email: &str) -> Result<usize> {
        self.get_or_load(email, CountKind::Columns).await
    }

    async fn get_or_load(&self, email: &str, kind: CountKind) -> Result<usize> {
        let token = {
            let state = self.state.read().await;
            if let Some(count) = state.entries.get(email).and_then(|e| e.get(kind)) {
                return Ok(count);
            }
            state.token(email)
        };

        let count = match kind {
            CountKind::Memos => self.service.get_memo_count(email).await?,
            CountKind::Columns => self.service.get_column_count(email).await?,
        };

        let mut state = self.state.write().await;
        if state.token(email) == token {
            *state.entries.entry(email.to_string()).or_default().slot(kind) = Some(count);
        } else {
            tracing::debug!(email, ?kind, "Count invalidated during load, not caching");
        }
        Ok(count)
    }

    /// Drops both counts of one user, including any load still in flight.
    pub async fn invalidate(&self, email: &str) {
        let mut state = self.state.write().await;
        let entry = state.entries.entry(email.to_string()).or_default();
        entry.generation += 1;
        entry.memos = None;
        entry.columns = None;
    }

    /// Clears all cached counts, including any load still in flight.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use monologue_core::config::RootConfig;
    use monologue_core::content::{Memo, MemoRepository};
    use monologue_core::StoreError;
    use monologue_infrastructure::{
        DocumentColumnRepository, DocumentMemoRepository, InMemoryDocumentStore,
    };
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn memo(id: &str) -> Memo {
        Memo {
            id: id.to_string(),
            email: "alice@x.com".to_string(),
            content: String::new(),
            categories: BTreeSet::new(),
            date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_counts_cached_until_invalidated() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = Arc::new(FollowGraphService::from_store(
            store.clone(),
            &RootConfig::default(),
        ));
        let memos = DocumentMemoRepository::new(store.clone(), "Memo");
        let cache = CountCache::new(service);

        memos.save(&memo("m1")).await.unwrap();
        assert_eq!(cache.get_or_load_memo_count("alice@x.com").await.unwrap(), 1);

        memos.save(&memo("m2")).await.unwrap();
        assert_eq!(cache.get_or_load_memo_count("alice@x.com").await.unwrap(), 1);

        cache.invalidate("alice@x.com").await;
        assert_eq!(cache.get_or_load_memo_count("alice@x.com").await.unwrap(), 2);
        assert_eq!(cache.get_or_load_column_count("alice@x.com").await.unwrap(), 0);

        memos.save(&memo("m3")).await.unwrap();
        cache.clear().await;
        assert_eq!(cache.get_or_load_memo_count("alice@x.com").await.unwrap(), 3);
    }

    /// Memo repository whose first load reads the count, then waits until
    /// the test releases it.
    struct GatedMemos {
        count: AtomicUsize,
        gate_first_load: AtomicBool,
        started: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl MemoRepository for GatedMemos {
        async fn load_by_user_email(&self, email: &str) -> std::result::Result<Vec<Memo>, StoreError> {
            let count = self.count.load(Ordering::SeqCst);
            if self.gate_first_load.swap(false, Ordering::SeqCst) {
                self.started.notify_one();
                self.release.notified().await;
            }
            let mut memo = memo("m");
            memo.email = email.to_string();
            Ok(vec![memo; count])
        }

        async fn save(&self, _memo: &Memo) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_load_racing_invalidate_is_not_cached() {
        let store: Arc<InMemoryDocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let memos = Arc::new(GatedMemos {
            count: AtomicUsize::new(1),
            gate_first_load: AtomicBool::new(true),
            started: Notify::new(),
            release: Notify::new(),
        });
        let service = Arc::new(FollowGraphService::new(
            store.clone(),
            memos.clone(),
            Arc::new(DocumentColumnRepository::new(store, "Column")),
            &RootConfig::default(),
        ));
        let cache = Arc::new(CountCache::new(service));

        let in_flight = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_load_memo_count("alice@x.com").await })
        };
        memos.started.notified().await;

        // The user posts while the old count is in flight
        memos.count.store(2, Ordering::SeqCst);
        cache.invalidate("alice@x.com").await;
        memos.release.notify_one();

        assert_eq!(in_flight.await.unwrap().unwrap(), 1);
        assert_eq!(cache.get_or_load_memo_count("alice@x.com").await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_load_racing_clear_is_not_cached() {
        let store: Arc<InMemoryDocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let memos = Arc::new(GatedMemos {
            count: AtomicUsize::new(3),
            gate_first_load: AtomicBool::new(true),
            started: Notify::new(),
            release: Notify::new(),
        });
        let service = Arc::new(FollowGraphService::new(
            store.clone(),
            memos.clone(),
            Arc::new(DocumentColumnRepository::new(store, "Column")),
            &RootConfig::default(),
        ));
        let cache = Arc::new(CountCache::new(service));

        let in_flight = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_load_memo_count("alice@x.com").await })
        };
        memos.started.notified().await;
        memos.count.store(4, Ordering::SeqCst);
        cache.clear().await;
        memos.release.notify_one();

        assert_eq!(in_flight.await.unwrap().unwrap(), 3);
        assert_eq!(cache.get_or_load_memo_count("alice@x.com").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = Arc::new(FollowGraphService::from_store(
            store.clone(),
            &RootConfig::default(),
        ));
        let cache = CountCache::new(service);

        store
            .fail_next(StoreError::unavailable("offline"))
            .await;
        assert!(cache.get_or_load_column_count("alice@x.com").await.is_err());
        assert_eq!(cache.get_or_load_column_count("alice@x.com").await.unwrap(), 0);
    }
}
