//! Document store collaborator.
//!
//! Defines the interface to the external document database the follow graph
//! lives in. The store is authoritative; nothing in this workspace keeps its
//! own copy of the graph.

mod transaction;

pub use transaction::{FieldTransform, FieldUpdate, Transaction};

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A schemaless document: a JSON object of top-level fields.
pub type Document = Map<String, Value>;

/// Practical ceiling on keys per membership query.
pub const DEFAULT_MAX_BATCH_KEYS: usize = 30;

/// An abstract document database.
///
/// Documents live in named collections and are addressed by string keys.
/// Implementations decide transport, retry timing and isolation; callers
/// only rely on the contracts below.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Document))`: document found
    /// - `Ok(None)`: no document at that key
    /// - `Err(_)`: the store could not be reached
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Writes `document` at `key`, replacing whatever was there.
    async fn set(&self, collection: &str, key: &str, document: Document) -> Result<(), StoreError>;

    /// Writes the top-level fields of `document` into the stored document,
    /// leaving fields it does not mention untouched. Creates the document
    /// when absent.
    async fn merge(&self, collection: &str, key: &str, document: Document)
    -> Result<(), StoreError>;

    /// Membership query: every document whose key is in `keys`.
    ///
    /// Result order is store-defined. Callers must not pass duplicate keys or
    /// more than [`max_batch_keys`](Self::max_batch_keys) keys.
    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> Result<Vec<(String, Document)>, StoreError>;

    /// Every document whose `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError>;

    /// Applies all updates of `transaction` atomically.
    ///
    /// Conflicts with concurrent writers are retried by the store up to its
    /// own ceiling; exhausting it yields [`StoreError::TransactionConflict`].
    async fn commit(&self, transaction: Transaction) -> Result<(), StoreError>;

    /// Largest number of keys [`get_many`](Self::get_many) accepts.
    fn max_batch_keys(&self) -> usize {
        DEFAULT_MAX_BATCH_KEYS
    }
}
