//! Memo and column repository traits.
//!
//! The follow graph only needs to count a user's posts, but the repositories
//! expose the full lists so counts stay consistent with what list views show.

use super::model::{Column, Memo};
use crate::error::StoreError;
use async_trait::async_trait;

/// An abstract repository for memos.
#[async_trait]
pub trait MemoRepository: Send + Sync {
    /// Loads every memo owned by `email`, newest first.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Memo>)`: possibly empty
    /// - `Err(_)`: the backing store failed
    async fn load_by_user_email(&self, email: &str) -> Result<Vec<Memo>, StoreError>;

    /// Saves a memo, replacing any memo with the same id.
    async fn save(&self, memo: &Memo) -> Result<(), StoreError>;
}

/// An abstract repository for columns.
#[async_trait]
pub trait ColumnRepository: Send + Sync {
    /// Loads every column owned by `email`, newest first.
    async fn load_by_user_email(&self, email: &str) -> Result<Vec<Column>, StoreError>;

    /// Saves a column, replacing any column with the same id.
    async fn save(&self, column: &Column) -> Result<(), StoreError>;
}
