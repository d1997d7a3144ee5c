//! User document DTO.
//!
//! Field names follow the documents already in the `User` collection. The
//! email is the document key and is not stored as a field.

use super::lenient;
use chrono::{DateTime, Utc};
use monologue_core::StoreError;
use monologue_core::store::Document;
use monologue_core::user::{UserPatch, UserRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const FOLLOWERS_FIELD: &str = "followers";
pub const FOLLOWINGS_FIELD: &str = "followings";
pub const REGISTRATION_DATE_FIELD: &str = "registrationDate";

/// Stored shape of a [`UserRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default, deserialize_with = "lenient::string")]
    pub uid: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub nickname: String,
    /// Absent from update payloads so updates never overwrite it.
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub preferred_categories: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub profile_image_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub introduction: String,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub followings: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub followers: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub blocked: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient::string_set")]
    pub likes: BTreeSet<String>,
}

impl UserDocument {
    /// The full document written at account creation.
    pub fn for_create(user: &UserRecord) -> Self {
        Self {
            registration_date: Some(user.registration_date),
            ..Self::for_update(user)
        }
    }

    /// Every mutable field, without `registrationDate`.
    pub fn for_update(user: &UserRecord) -> Self {
        Self {
            uid: user.uid.clone(),
            nickname: user.nickname.clone(),
            registration_date: None,
            preferred_categories: user.preferred_categories.clone(),
            profile_image_name: user.profile_image_name.clone(),
            introduction: user.introduction.clone(),
            followings: user.followings.clone(),
            followers: user.followers.clone(),
            blocked: user.blocked.clone(),
            likes: user.likes.clone(),
        }
    }

    /// Decodes a stored document. Missing or mistyped fields default.
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        into_object(serde_json::to_value(self)?)
    }

    /// Converts to the domain model. A missing registration date reads as now.
    pub fn into_record(self, email: &str) -> UserRecord {
        let registration_date = self.registration_date.unwrap_or_else(|| {
            tracing::warn!(
                email,
                "User document has no usable registrationDate, using current time"
            );
            Utc::now()
        });

        UserRecord {
            uid: self.uid,
            email: email.to_string(),
            nickname: self.nickname,
            registration_date,
            preferred_categories: self.preferred_categories,
            profile_image_name: self.profile_image_name,
            introduction: self.introduction,
            followers: self.followers,
            followings: self.followings,
            blocked: self.blocked,
            likes: self.likes,
        }
    }
}

/// Encodes only the fields a patch supplies.
pub fn patch_to_document(patch: &UserPatch) -> Result<Document, StoreError> {
    into_object(serde_json::to_value(patch)?)
}

pub(crate) fn into_object(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}
