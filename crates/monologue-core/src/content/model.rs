use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A short journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: String,
    /// Owner email
    pub email: String,
    pub content: String,
    pub categories: BTreeSet<String>,
    pub date: DateTime<Utc>,
}

/// A long-form post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    /// Owner email
    pub email: String,
    pub title: String,
    pub content: String,
    pub categories: BTreeSet<String>,
    pub date: DateTime<Utc>,
}
