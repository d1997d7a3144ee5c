//! Field decoders that never fail.
//!
//! Documents written by older clients may lack fields or carry them with the
//! wrong type. Each decoder here falls back to the type's empty value instead
//! of rejecting the whole document. Pair them with `#[serde(default)]` so that
//! absent fields take the same path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// A string, or `""` for anything else.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// The string elements of an array; non-strings and non-arrays are dropped.
pub fn string_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => BTreeSet::new(),
    })
}

/// An RFC 3339 timestamp, or `None` when absent or unparsable.
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "string")]
        name: String,
        #[serde(default, deserialize_with = "string_set")]
        tags: BTreeSet<String>,
        #[serde(default, deserialize_with = "timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_missing_fields_default() {
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert_eq!(probe.name, "");
        assert!(probe.tags.is_empty());
        assert!(probe.at.is_none());
    }

    #[test]
    fn test_wrong_types_default() {
        let probe: Probe =
            serde_json::from_value(json!({ "name": 42, "tags": "x", "at": null })).unwrap();
        assert_eq!(probe.name, "");
        assert!(probe.tags.is_empty());
        assert!(probe.at.is_none());
    }

    #[test]
    fn test_mixed_array_keeps_strings() {
        let probe: Probe = serde_json::from_value(json!({ "tags": ["a", 1, "b", "a"] })).unwrap();
        assert_eq!(probe.tags.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_timestamp_parses_offsets() {
        let probe: Probe =
            serde_json::from_value(json!({ "at": "2024-01-01T09:00:00+09:00" })).unwrap();
        assert_eq!(probe.at.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let probe: Probe = serde_json::from_value(json!({ "at": "yesterday" })).unwrap();
        assert!(probe.at.is_none());
    }
}
