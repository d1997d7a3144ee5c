//! UserRecord domain model.
//!
//! One record per user, keyed by email. The follow graph is stored
//! redundantly: an edge A -> B lives in `A.followings` and in `B.followers`.

use crate::email::validate_email;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User record domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Opaque identifier issued by the authentication provider
    pub uid: String,
    /// Unique key of the record, immutable once created
    pub email: String,
    /// Display name
    pub nickname: String,
    /// Set once at creation and never written by updates
    pub registration_date: DateTime<Utc>,
    pub preferred_categories: BTreeSet<String>,
    pub profile_image_name: String,
    pub introduction: String,
    /// Emails of users who follow this user
    pub followers: BTreeSet<String>,
    /// Emails of users this user follows
    pub followings: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
    pub likes: BTreeSet<String>,
}

impl UserRecord {
    /// Creates a fresh record as written at first login.
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        nickname: impl Into<String>,
        registration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            nickname: nickname.into(),
            registration_date,
            preferred_categories: BTreeSet::new(),
            profile_image_name: String::new(),
            introduction: String::new(),
            followers: BTreeSet::new(),
            followings: BTreeSet::new(),
            blocked: BTreeSet::new(),
            likes: BTreeSet::new(),
        }
    }

    /// Whether this user follows `target_email`.
    pub fn is_following(&self, target_email: &str) -> bool {
        self.followings.contains(target_email)
    }

    /// Whether `email` follows this user.
    pub fn is_followed_by(&self, email: &str) -> bool {
        self.followers.contains(email)
    }

    pub fn follower_count(&self) -> usize {
        self.followers.len()
    }

    pub fn following_count(&self) -> usize {
        self.followings.len()
    }

    /// Checks the record before it is written as a whole.
    ///
    /// The email must be a valid key and must not appear in the record's own
    /// `followers` or `followings`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        if self.is_following(&self.email) || self.is_followed_by(&self.email) {
            return Err(ValidationError::SelfReference(self.email.clone()));
        }
        Ok(())
    }
}
