//! Memo and column document DTOs.
//!
//! Both carry the owner's email as a field so the repositories can filter on
//! it; the document key is the post id.

use super::lenient;
use super::user_document::into_object;
use chrono::{DateTime, Utc};
use monologue_core::StoreError;
use monologue_core::content::{Column, Memo};
use monologue_core::store::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const OWNER_FIELD: &str = "email";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoDocument {
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub categories: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub date: Option<DateTime<Utc>>,
}

impl MemoDocument {
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        into_object(serde_json::to_value(self)?)
    }

    /// Converts to the domain model. Undated memos sort as oldest.
    pub fn into_memo(self, id: String) -> Memo {
        Memo {
            id,
            email: self.email,
            content: self.content,
            categories: self.categories,
            date: self.date.unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl From<&Memo> for MemoDocument {
    fn from(memo: &Memo) -> Self {
        Self {
            email: memo.email.clone(),
            content: memo.content.clone(),
            categories: memo.categories.clone(),
            date: Some(memo.date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDocument {
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub categories: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub date: Option<DateTime<Utc>>,
}

impl ColumnDocument {
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        into_object(serde_json::to_value(self)?)
    }

    pub fn into_column(self, id: String) -> Column {
        Column {
            id,
            email: self.email,
            title: self.title,
            content: self.content,
            categories: self.categories,
            date: self.date.unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl From<&Column> for ColumnDocument {
    fn from(column: &Column) -> Self {
        Self {
            email: column.email.clone(),
            title: column.title.clone(),
            content: column.content.clone(),
            categories: column.categories.clone(),
            date: Some(column.date),
        }
    }
}
