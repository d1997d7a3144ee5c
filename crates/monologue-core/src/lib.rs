//! Domain layer of the Monologue follow graph.
//!
//! Holds the models, the error taxonomy and the collaborator traits
//! (document store, memo and column repositories). Nothing here performs I/O.

pub mod config;
pub mod content;
pub mod email;
pub mod error;
pub mod store;
pub mod user;

// Re-export common error type
pub use error::{FollowError, MonologueError, StoreError, ValidationError};
