//! Partial profile updates.

use super::model::UserRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A partial update of the profile fields of a [`UserRecord`].
///
/// Only `Some` fields are written. There is deliberately no way to touch
/// `registration_date`, `followers` or `followings` through a patch: the
/// first is immutable and the follow sets are owned by follow/unfollow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_categories: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<BTreeSet<String>>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn introduction(mut self, introduction: impl Into<String>) -> Self {
        self.introduction = Some(introduction.into());
        self
    }

    pub fn profile_image_name(mut self, name: impl Into<String>) -> Self {
        self.profile_image_name = Some(name.into());
        self
    }

    pub fn preferred_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn blocked<I, S>(mut self, blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked = Some(blocked.into_iter().map(Into::into).collect());
        self
    }

    pub fn likes<I, S>(mut self, likes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.likes = Some(likes.into_iter().map(Into::into).collect());
        self
    }

    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch to a local copy of the record.
    pub fn apply_to(&self, user: &mut UserRecord) {
        if let Some(nickname) = &self.nickname {
            user.nickname = nickname.clone();
        }
        if let Some(categories) = &self.preferred_categories {
            user.preferred_categories = categories.clone();
        }
        if let Some(name) = &self.profile_image_name {
            user.profile_image_name = name.clone();
        }
        if let Some(introduction) = &self.introduction {
            user.introduction = introduction.clone();
        }
        if let Some(blocked) = &self.blocked {
            user.blocked = blocked.clone();
        }
        if let Some(likes) = &self.likes {
            user.likes = likes.clone();
        }
    }
}
