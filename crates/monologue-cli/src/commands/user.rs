use super::{AppContext, print_json};
use anyhow::{Result, anyhow};
use chrono::Utc;
use monologue_core::user::{UserPatch, UserRecord};
use uuid::Uuid;

pub async fn create(
    ctx: &AppContext,
    email: String,
    nickname: String,
    introduction: String,
    categories: Vec<String>,
) -> Result<()> {
    let mut user = UserRecord::new(Uuid::new_v4().to_string(), email, nickname, Utc::now());
    user.introduction = introduction;
    user.preferred_categories = categories.into_iter().collect();

    ctx.service.create_user(&user).await?;
    print_json(&user)
}

pub async fn show(ctx: &AppContext, email: &str) -> Result<()> {
    let user = ctx
        .service
        .load_user(email)
        .await?
        .ok_or_else(|| anyhow!("No user with email {}", email))?;
    print_json(&user)
}

pub fn build_patch(
    nickname: Option<String>,
    introduction: Option<String>,
    profile_image: Option<String>,
    categories: Option<Vec<String>>,
) -> UserPatch {
    UserPatch {
        nickname,
        introduction,
        profile_image_name: profile_image,
        preferred_categories: categories.map(|c| c.into_iter().collect()),
        ..UserPatch::default()
    }
}

pub async fn update(ctx: &AppContext, email: &str, patch: UserPatch) -> Result<()> {
    if ctx.service.load_user(email).await?.is_none() {
        return Err(anyhow!("No user with email {}", email));
    }
    if patch.is_empty() {
        tracing::warn!(email, "Nothing to update");
    }
    ctx.service.patch_user(email, &patch).await?;
    show(ctx, email).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_patch_only_sets_given_flags() {
        let patch = build_patch(Some("alice".to_string()), None, None, None);
        assert_eq!(patch.nickname.as_deref(), Some("alice"));
        assert!(patch.introduction.is_none());
        assert!(patch.preferred_categories.is_none());

        assert!(build_patch(None, None, None, None).is_empty());

        let patch = build_patch(None, None, None, Some(vec!["a".into(), "b".into(), "a".into()]));
        assert_eq!(patch.preferred_categories.map(|c| c.len()), Some(2));
    }
}
