//! The signed-in user of a client.
//!
//! A `UserSession` owns the cached record of the current user. Follow,
//! unfollow and profile edits go through it so the cached copy reflects the
//! caller's own writes immediately, without a reload.

use crate::follow_graph::FollowGraphService;
use monologue_core::FollowError;
use monologue_core::error::Result;
use monologue_core::user::{UserPatch, UserRecord};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct UserSession {
    service: Arc<FollowGraphService>,
    current: RwLock<Option<UserRecord>>,
}

impl UserSession {
    /// Creates a signed-out session.
    pub fn new(service: Arc<FollowGraphService>) -> Self {
        Self {
            service,
            current: RwLock::new(None),
        }
    }

    /// Loads `email` and makes it the current user.
    ///
    /// # Returns
    ///
    /// The loaded record, or `None` (and a signed-out session) when no such
    /// user exists.
    pub async fn sign_in(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = self.service.load_user(email).await?;
        *self.current.write().await = user.clone();

        match &user {
            Some(_) => tracing::info!(email, "Signed in"),
            None => tracing::warn!(email, "Sign-in for unknown user"),
        }
        Ok(user)
    }

    /// Creates `user` in the store and signs in as it.
    pub async fn register(&self, user: UserRecord) -> Result<()> {
        self.service.create_user(&user).await?;
        *self.current.write().await = Some(user);
        Ok(())
    }

    /// Reloads the current user from the store.
    ///
    /// Signs out if the record has disappeared. Signed-out sessions stay
    /// signed out.
    pub async fn refresh(&self) -> Result<Option<UserRecord>> {
        let Some(email) = self.current_email().await else {
            return Ok(None);
        };
        let user = self.service.load_user(&email).await?;

        let mut current = self.current.write().await;
        if current.as_ref().is_some_and(|u| u.email == email) {
            *current = user.clone();
        }
        Ok(user)
    }

    pub async fn sign_out(&self) {
        *self.current.write().await = None;
    }

    pub async fn current_user(&self) -> Option<UserRecord> {
        self.current.read().await.clone()
    }

    async fn current_email(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|u| u.email.clone())
    }

    /// Follows `target_email` as the current user.
    pub async fn follow(&self, target_email: &str) -> std::result::Result<(), FollowError> {
        let email = self
            .current_email()
            .await
            .ok_or(FollowError::MissingCurrentUser)?;
        self.service.follow(&email, target_email).await?;

        self.update_cached(&email, |user| {
            user.followings.insert(target_email.to_string());
        })
        .await;
        Ok(())
    }

    /// Unfollows `target_email` as the current user.
    pub async fn unfollow(&self, target_email: &str) -> std::result::Result<(), FollowError> {
        let email = self
            .current_email()
            .await
            .ok_or(FollowError::MissingCurrentUser)?;
        self.service.unfollow(&email, target_email).await?;

        self.update_cached(&email, |user| {
            user.followings.remove(target_email);
        })
        .await;
        Ok(())
    }

    /// Answers from the cached record; `false` when signed out.
    pub async fn is_following(&self, target_email: &str) -> bool {
        let current = self.current.read().await;
        FollowGraphService::is_following(current.as_ref(), target_email)
    }

    /// Writes `patch` to the current user's record and applies it locally.
    ///
    /// # Returns
    ///
    /// The updated cached record, or `None` when signed out (nothing is
    /// written).
    pub async fn update_profile(&self, patch: &UserPatch) -> Result<Option<UserRecord>> {
        let Some(email) = self.current_email().await else {
            return Ok(None);
        };
        self.service.patch_user(&email, patch).await?;

        Ok(self.update_cached(&email, |user| patch.apply_to(user)).await)
    }

    /// Mutates the cached record if `email` is still the signed-in user.
    async fn update_cached<F>(&self, email: &str, mutate: F) -> Option<UserRecord>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut current = self.current.write().await;
        match current.as_mut() {
            Some(user) if user.email == email => {
                mutate(user);
                Some(user.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use monologue_core::StoreError;
    use monologue_core::config::RootConfig;
    use monologue_infrastructure::InMemoryDocumentStore;

    fn setup() -> (Arc<InMemoryDocumentStore>, Arc<FollowGraphService>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = Arc::new(FollowGraphService::from_store(
            store.clone(),
            &RootConfig::default(),
        ));
        (store, service)
    }

    fn user(email: &str) -> UserRecord {
        UserRecord::new("uid", email, "nick", Utc::now())
    }

    #[tokio::test]
    async fn test_sign_in_unknown_user_stays_signed_out() {
        let (_, service) = setup();
        let session = UserSession::new(service);

        assert!(session.sign_in("ghost@x.com").await.unwrap().is_none());
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_follow_updates_cache_without_reload() {
        let (_, service) = setup();
        service.create_user(&user("bob@x.com")).await.unwrap();
        let session = UserSession::new(service.clone());
        session.register(user("alice@x.com")).await.unwrap();

        session.follow("bob@x.com").await.unwrap();
        assert!(session.is_following("bob@x.com").await);

        let bob = service.load_user("bob@x.com").await.unwrap().unwrap();
        assert!(bob.is_followed_by("alice@x.com"));

        session.unfollow("bob@x.com").await.unwrap();
        assert!(!session.is_following("bob@x.com").await);
    }

    #[tokio::test]
    async fn test_failed_follow_leaves_cache_untouched() {
        let (store, service) = setup();
        service.create_user(&user("bob@x.com")).await.unwrap();
        let session = UserSession::new(service);
        session.register(user("alice@x.com")).await.unwrap();

        store.fail_next(StoreError::unavailable("offline")).await;
        assert!(session.follow("bob@x.com").await.is_err());
        assert!(!session.is_following("bob@x.com").await);
    }

    #[tokio::test]
    async fn test_signed_out_session() {
        let (_, service) = setup();
        let session = UserSession::new(service);

        assert_eq!(
            session.follow("bob@x.com").await,
            Err(FollowError::MissingCurrentUser)
        );
        assert!(!session.is_following("bob@x.com").await);
        assert!(
            session
                .update_profile(&UserPatch::new().nickname("x"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(session.refresh().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_and_refresh() {
        let (_, service) = setup();
        let session = UserSession::new(service.clone());
        session.register(user("alice@x.com")).await.unwrap();

        let updated = session
            .update_profile(&UserPatch::new().introduction("hi"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.introduction, "hi");

        // Someone else follows alice; refresh picks it up
        service.create_user(&user("bob@x.com")).await.unwrap();
        service.follow("bob@x.com", "alice@x.com").await.unwrap();
        let refreshed = session.refresh().await.unwrap().unwrap();
        assert!(refreshed.is_followed_by("bob@x.com"));
        assert_eq!(refreshed.introduction, "hi");

        session.sign_out().await;
        assert!(session.current_user().await.is_none());
    }
}
