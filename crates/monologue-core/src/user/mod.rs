//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: the [`UserRecord`] stored per email
//! - `patch`: [`UserPatch`], a partial profile update
//!
//! # Usage
//!
//! ```ignore
//! use monologue_core::user::{UserPatch, UserRecord};
//! ```

mod model;
mod patch;

// Re-export public API
pub use model::UserRecord;
pub use patch::UserPatch;

/// Whether `user` follows `target_email`.
///
/// A pure function of the record the caller supplies; `false` when there is
/// no record. The answer is only as fresh as the record.
pub fn is_following(user: Option<&UserRecord>, target_email: &str) -> bool {
    user.is_some_and(|user| user.is_following(target_email))
}
