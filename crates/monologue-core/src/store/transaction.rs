//! Multi-document transactions built from field-level array operators.

use super::Document;
use serde_json::Value;

/// How a single array field is rewritten.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    /// Append each value not already present.
    ArrayUnion(Vec<Value>),
    /// Remove every occurrence of each value.
    ArrayRemove(Vec<Value>),
}

impl FieldTransform {
    /// Applies the transform to the current field value.
    ///
    /// A missing or non-array field is treated as an empty array, so the
    /// result is always an array.
    pub fn apply(&self, current: Option<&Value>) -> Value {
        let mut items = match current {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        match self {
            FieldTransform::ArrayUnion(values) => {
                for value in values {
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
            }
            FieldTransform::ArrayRemove(values) => {
                items.retain(|item| !values.contains(item));
            }
        }
        Value::Array(items)
    }
}

/// One field update inside a [`Transaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub collection: String,
    pub key: String,
    pub field: String,
    pub transform: FieldTransform,
}

impl FieldUpdate {
    /// Applies this update to a document in place.
    pub fn apply_to(&self, document: &mut Document) {
        let updated = self.transform.apply(document.get(&self.field));
        document.insert(self.field.clone(), updated);
    }
}

/// A set of field updates that commit together or not at all.
///
/// Every document a transaction touches must already exist; the store fails
/// the whole transaction with
/// [`StoreError::DocumentMissing`](crate::error::StoreError::DocumentMissing)
/// otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    updates: Vec<FieldUpdate>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn array_union<I, S>(mut self, collection: &str, key: &str, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.updates.push(FieldUpdate {
            collection: collection.to_string(),
            key: key.to_string(),
            field: field.to_string(),
            transform: FieldTransform::ArrayUnion(string_values(values)),
        });
        self
    }

    pub fn array_remove<I, S>(mut self, collection: &str, key: &str, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.updates.push(FieldUpdate {
            collection: collection.to_string(),
            key: key.to_string(),
            field: field.to_string(),
            transform: FieldTransform::ArrayRemove(string_values(values)),
        });
        self
    }

    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Distinct `(collection, key)` pairs in first-touched order.
    pub fn document_keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<(String, String)> = Vec::new();
        for update in &self.updates {
            let key = (update.collection.clone(), update.key.clone());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

fn string_values<I, S>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(|v| Value::String(v.into())).collect()
}
