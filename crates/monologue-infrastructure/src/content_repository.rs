//! DocumentStore-backed memo and column repositories.

use crate::dto::{ColumnDocument, MemoDocument, OWNER_FIELD};
use async_trait::async_trait;
use monologue_core::StoreError;
use monologue_core::content::{Column, ColumnRepository, Memo, MemoRepository};
use monologue_core::store::DocumentStore;
use serde_json::Value;
use std::sync::Arc;

/// Memo repository over the `Memo` collection of a document store.
pub struct DocumentMemoRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl DocumentMemoRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl MemoRepository for DocumentMemoRepository {
    async fn load_by_user_email(&self, email: &str) -> Result<Vec<Memo>, StoreError> {
        let documents = self
            .store
            .query_eq(&self.collection, OWNER_FIELD, &Value::String(email.to_string()))
            .await?;

        let mut memos = documents
            .into_iter()
            .map(|(id, document)| Ok(MemoDocument::from_document(document)?.into_memo(id)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        // Most recent first
        memos.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(memos)
    }

    async fn save(&self, memo: &Memo) -> Result<(), StoreError> {
        let document = MemoDocument::from(memo).to_document()?;
        self.store.set(&self.collection, &memo.id, document).await
    }
}

/// Column repository over the `Column` collection of a document store.
pub struct DocumentColumnRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl DocumentColumnRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl ColumnRepository for DocumentColumnRepository {
    async fn load_by_user_email(&self, email: &str) -> Result<Vec<Column>, StoreError> {
        let documents = self
            .store
            .query_eq(&self.collection, OWNER_FIELD, &Value::String(email.to_string()))
            .await?;

        let mut columns = documents
            .into_iter()
            .map(|(id, document)| Ok(ColumnDocument::from_document(document)?.into_column(id)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        columns.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(columns)
    }

    async fn save(&self, column: &Column) -> Result<(), StoreError> {
        let document = ColumnDocument::from(column).to_document()?;
        self.store.set(&self.collection, &column.id, document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryDocumentStore;
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;

    fn memo(id: &str, email: &str, minutes_ago: i64) -> Memo {
        Memo {
            id: id.to_string(),
            email: email.to_string(),
            content: format!("memo {}", id),
            categories: BTreeSet::new(),
            date: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_memos_filtered_by_owner_newest_first() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let repo = DocumentMemoRepository::new(store, "Memo");

        repo.save(&memo("m1", "alice@x.com", 30)).await.unwrap();
        repo.save(&memo("m2", "bob@x.com", 20)).await.unwrap();
        repo.save(&memo("m3", "alice@x.com", 10)).await.unwrap();

        let memos = repo.load_by_user_email("alice@x.com").await.unwrap();
        let ids: Vec<_> = memos.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m1"]);

        assert!(repo.load_by_user_email("nobody@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_columns_save_replaces_same_id() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let repo = DocumentColumnRepository::new(store, "Column");

        let mut column = Column {
            id: "c1".to_string(),
            email: "alice@x.com".to_string(),
            title: "draft".to_string(),
            content: String::new(),
            categories: BTreeSet::new(),
            date: Utc::now(),
        };
        repo.save(&column).await.unwrap();
        column.title = "final".to_string();
        repo.save(&column).await.unwrap();

        let columns = repo.load_by_user_email("alice@x.com").await.unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].title, "final");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.fail_next(StoreError::unavailable("offline")).await;
        let repo = DocumentMemoRepository::new(store, "Memo");

        assert_eq!(
            repo.load_by_user_email("alice@x.com").await,
            Err(StoreError::unavailable("offline"))
        );
    }
}
