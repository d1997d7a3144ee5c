use serde::{Deserialize, Serialize};

/// Root of `config.toml`. Every section and field is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
    #[serde(default)]
    pub collections: CollectionNames,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Keys per membership query when loading users in bulk.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    crate::store::DEFAULT_MAX_BATCH_KEYS
}

/// Conflict retry policy of a store's transaction primitive.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles after each conflict.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    10
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    #[serde(default = "default_users")]
    pub users: String,
    #[serde(default = "default_memos")]
    pub memos: String,
    #[serde(default = "default_columns")]
    pub columns: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: default_users(),
            memos: default_memos(),
            columns: default_columns(),
        }
    }
}

fn default_users() -> String {
    "User".to_string()
}

fn default_memos() -> String {
    "Memo".to_string()
}

fn default_columns() -> String {
    "Column".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config, RootConfig::default());
        assert_eq!(config.graph.batch_size, 30);
        assert_eq!(config.transaction.max_attempts, 5);
        assert_eq!(config.collections.users, "User");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config: RootConfig = toml::from_str(
            r#"
[graph]
batch_size = 10

[collections]
users = "Users"
"#,
        )
        .unwrap();

        assert_eq!(config.graph.batch_size, 10);
        assert_eq!(config.collections.users, "Users");
        assert_eq!(config.collections.memos, "Memo");
        assert_eq!(config.transaction, TransactionConfig::default());
    }
}
