//! Follow graph service.
//!
//! Mutates and queries the directed follow relation between users plus the
//! per-user post counts. The store is the only state: the service can be
//! shared freely and holds nothing between calls.
//!
//! An edge A -> B is written to two documents, `A.followings` and
//! `B.followers`, always inside one store transaction so that no reader can
//! observe one half without the other.

use monologue_core::config::{CollectionNames, RootConfig};
use monologue_core::content::{ColumnRepository, MemoRepository};
use monologue_core::email::validate_email;
use monologue_core::error::Result;
use monologue_core::store::{DocumentStore, Transaction};
use monologue_core::user::{self, UserPatch, UserRecord};
use monologue_core::{FollowError, StoreError};
use monologue_infrastructure::dto::{
    FOLLOWERS_FIELD, FOLLOWINGS_FIELD, UserDocument, patch_to_document,
};
use monologue_infrastructure::{DocumentColumnRepository, DocumentMemoRepository};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Service owning follow/unfollow and user record access.
pub struct FollowGraphService {
    store: Arc<dyn DocumentStore>,
    memo_repository: Arc<dyn MemoRepository>,
    column_repository: Arc<dyn ColumnRepository>,
    collections: CollectionNames,
    batch_size: usize,
}

impl FollowGraphService {
    /// Creates a service over explicit collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        memo_repository: Arc<dyn MemoRepository>,
        column_repository: Arc<dyn ColumnRepository>,
        config: &RootConfig,
    ) -> Self {
        Self {
            store,
            memo_repository,
            column_repository,
            collections: config.collections.clone(),
            batch_size: config.graph.batch_size.max(1),
        }
    }

    /// Creates a service whose memo and column repositories live in the same
    /// store as the users.
    pub fn from_store(store: Arc<dyn DocumentStore>, config: &RootConfig) -> Self {
        let memo_repository = Arc::new(DocumentMemoRepository::new(
            Arc::clone(&store),
            config.collections.memos.clone(),
        ));
        let column_repository = Arc::new(DocumentColumnRepository::new(
            Arc::clone(&store),
            config.collections.columns.clone(),
        ));
        Self::new(store, memo_repository, column_repository, config)
    }

    fn users(&self) -> &str {
        &self.collections.users
    }

    // ============================================================================
    // User records
    // ============================================================================

    /// Writes a brand-new record, replacing any document at that email.
    ///
    /// A record naming itself among its followers or followings is rejected
    /// before any I/O.
    pub async fn create_user(&self, user: &UserRecord) -> Result<()> {
        user.validate()?;
        let document = UserDocument::for_create(user).to_document()?;
        self.store.set(self.users(), &user.email, document).await?;

        tracing::info!(email = %user.email, "Created user record");
        Ok(())
    }

    /// Overwrites every field of the record except `registrationDate`.
    ///
    /// Each field sent replaces the stored value wholesale; the sets are not
    /// unioned. Callers must therefore pass the complete current record, or
    /// fields such as `followers` are reset. Prefer [`patch_user`] for
    /// profile edits.
    ///
    /// [`patch_user`]: Self::patch_user
    pub async fn update_user(&self, user: &UserRecord) -> Result<()> {
        user.validate()?;
        let document = UserDocument::for_update(user).to_document()?;
        self.store.merge(self.users(), &user.email, document).await?;

        tracing::debug!(email = %user.email, "Updated user record");
        Ok(())
    }

    /// Writes only the fields `patch` supplies. An empty patch is a no-op.
    pub async fn patch_user(&self, email: &str, patch: &UserPatch) -> Result<()> {
        validate_email(email)?;
        if patch.is_empty() {
            return Ok(());
        }
        let document = patch_to_document(patch)?;
        self.store.merge(self.users(), email, document).await?;

        tracing::debug!(email, fields = patch_field_count(patch), "Patched user record");
        Ok(())
    }

    /// Point read. `Ok(None)` when there is no such user.
    pub async fn load_user(&self, email: &str) -> Result<Option<UserRecord>> {
        validate_email(email)?;
        let Some(document) = self.store.get(self.users(), email).await? else {
            tracing::debug!(email, "No user record");
            return Ok(None);
        };
        Ok(Some(UserDocument::from_document(document)?.into_record(email)))
    }

    /// Loads every existing user among `emails`.
    ///
    /// Duplicates are removed and the keys are queried in batches no larger
    /// than the configured batch size or the store's own limit. Unknown
    /// emails are skipped. Order of the result is unspecified.
    pub async fn load_users_by_emails<I, S>(&self, emails: I) -> Result<Vec<UserRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = BTreeSet::new();
        for email in emails {
            let email = email.as_ref();
            validate_email(email)?;
            keys.insert(email.to_string());
        }
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = keys.into_iter().collect();
        let chunk_size = self.batch_size.min(self.store.max_batch_keys()).max(1);

        let mut users = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(chunk_size) {
            let documents = self.store.get_many(self.users(), chunk).await?;
            for (email, document) in documents {
                users.push(UserDocument::from_document(document)?.into_record(&email));
            }
        }

        tracing::debug!(
            requested = keys.len(),
            found = users.len(),
            batches = keys.len().div_ceil(chunk_size),
            "Loaded users by email"
        );
        Ok(users)
    }

    /// Records of the users following `email`. Empty for unknown users.
    pub async fn load_followers(&self, email: &str) -> Result<Vec<UserRecord>> {
        match self.load_user(email).await? {
            Some(user) => self.load_users_by_emails(&user.followers).await,
            None => Ok(Vec::new()),
        }
    }

    /// Records of the users `email` follows. Empty for unknown users.
    pub async fn load_followings(&self, email: &str) -> Result<Vec<UserRecord>> {
        match self.load_user(email).await? {
            Some(user) => self.load_users_by_emails(&user.followings).await,
            None => Ok(Vec::new()),
        }
    }

    // ============================================================================
    // Counts
    // ============================================================================

    /// Number of memos owned by `email`.
    pub async fn get_memo_count(&self, email: &str) -> Result<usize> {
        validate_email(email)?;
        Ok(self.memo_repository.load_by_user_email(email).await?.len())
    }

    /// Number of columns owned by `email`.
    pub async fn get_column_count(&self, email: &str) -> Result<usize> {
        validate_email(email)?;
        Ok(self.column_repository.load_by_user_email(email).await?.len())
    }

    // ============================================================================
    // Follow graph
    // ============================================================================

    /// Makes `current_email` follow `target_email`.
    ///
    /// Following someone already followed succeeds without changing anything.
    pub async fn follow(
        &self,
        current_email: &str,
        target_email: &str,
    ) -> std::result::Result<(), FollowError> {
        validate_pair(current_email, target_email)?;

        let transaction = Transaction::new()
            .array_union(self.users(), current_email, FOLLOWINGS_FIELD, [target_email])
            .array_union(self.users(), target_email, FOLLOWERS_FIELD, [current_email]);
        self.store
            .commit(transaction)
            .await
            .map_err(into_follow_error)?;

        tracing::info!(
            follower = current_email,
            followee = target_email,
            "Followed user"
        );
        Ok(())
    }

    /// Makes `current_email` stop following `target_email`.
    ///
    /// Unfollowing someone not followed succeeds without changing anything.
    pub async fn unfollow(
        &self,
        current_email: &str,
        target_email: &str,
    ) -> std::result::Result<(), FollowError> {
        validate_pair(current_email, target_email)?;

        let transaction = Transaction::new()
            .array_remove(self.users(), current_email, FOLLOWINGS_FIELD, [target_email])
            .array_remove(self.users(), target_email, FOLLOWERS_FIELD, [current_email]);
        self.store
            .commit(transaction)
            .await
            .map_err(into_follow_error)?;

        tracing::info!(
            follower = current_email,
            followee = target_email,
            "Unfollowed user"
        );
        Ok(())
    }

    /// Whether `user` follows `target_email`, judged from the supplied record
    /// alone. Load the record first when the answer must be authoritative.
    pub fn is_following(user: Option<&UserRecord>, target_email: &str) -> bool {
        user::is_following(user, target_email)
    }
}

/// Local checks shared by follow and unfollow; no I/O happens on failure.
fn validate_pair(current_email: &str, target_email: &str) -> std::result::Result<(), FollowError> {
    if current_email.is_empty() {
        return Err(FollowError::MissingCurrentUser);
    }
    if target_email.is_empty() {
        return Err(FollowError::MissingTarget);
    }
    validate_email(current_email)?;
    validate_email(target_email)?;
    if current_email == target_email {
        return Err(FollowError::SelfFollow(current_email.to_string()));
    }
    Ok(())
}

fn into_follow_error(err: StoreError) -> FollowError {
    match err {
        StoreError::DocumentMissing { key, .. } => FollowError::UserNotFound(key),
        other => {
            tracing::warn!(error = %other, "Follow graph transaction failed");
            FollowError::TransactionFailed(other)
        }
    }
}

fn patch_field_count(patch: &UserPatch) -> usize {
    [
        patch.nickname.is_some(),
        patch.preferred_categories.is_some(),
        patch.profile_image_name.is_some(),
        patch.introduction.is_some(),
        patch.blocked.is_some(),
        patch.likes.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
}
