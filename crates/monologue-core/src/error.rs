//! Error types for the Monologue follow graph.
//!
//! Errors are layered the same way the crates are: [`ValidationError`] is
//! raised locally before any I/O, [`StoreError`] comes back from a
//! [`DocumentStore`](crate::store::DocumentStore), and [`FollowError`] is the
//! contract of follow/unfollow. [`MonologueError`] wraps all of them for
//! callers that do not care about the distinction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier validation failure. Never involves the store.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("email must not be empty")]
    EmptyEmail,

    #[error("malformed email: '{0}'")]
    MalformedEmail(String),

    /// A record listing its own email among its followers or followings
    #[error("user '{0}' cannot appear in its own follow graph")]
    SelfReference(String),
}

/// Failure reported by the external document store.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreError {
    /// Transport or connectivity failure
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// A multi-document transaction kept conflicting until the retry ceiling
    #[error("transaction aborted after {attempts} conflicting attempts")]
    TransactionConflict { attempts: u32 },

    /// A field update targeted a document that does not exist
    #[error("document not found: {collection}/{key}")]
    DocumentMissing { collection: String, key: String },

    /// Membership query with more keys than the store accepts
    #[error("batch of {requested} keys exceeds the store limit of {max}")]
    BatchTooLarge { requested: usize, max: usize },

    /// Query the store refuses to run (e.g. duplicate membership values)
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Document could not be encoded or decoded
    #[error("document serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn document_missing(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DocumentMissing {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// True when retrying the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::TransactionConflict { .. }
        )
    }
}

/// Outcome of a failed follow or unfollow.
///
/// Any variant means the relationship was not changed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowError {
    #[error("no current user")]
    MissingCurrentUser,

    #[error("no target user")]
    MissingTarget,

    #[error("user '{0}' cannot follow themselves")]
    SelfFollow(String),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ValidationError),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("follow transaction failed: {0}")]
    TransactionFailed(#[source] StoreError),
}

/// A shared error type for the whole workspace.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MonologueError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Follow error: {0}")]
    Follow(#[from] FollowError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MonologueError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Follow(FollowError::InvalidEmail(_))
        )
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The underlying store failure, if there is one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            Self::Follow(FollowError::TransactionFailed(err)) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MonologueError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MonologueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MonologueError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MonologueError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for MonologueError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, MonologueError>`.
pub type Result<T> = std::result::Result<T, MonologueError>;
