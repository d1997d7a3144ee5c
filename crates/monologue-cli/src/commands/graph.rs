use super::{AppContext, print_json};
use anyhow::{Result, anyhow};
use monologue_core::user::UserRecord;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserCounts<'a> {
    email: &'a str,
    memos: usize,
    columns: usize,
    followers: usize,
    followings: usize,
}

#[derive(Serialize)]
struct FollowOutcome<'a> {
    follower: &'a str,
    followee: &'a str,
    following: bool,
}

pub async fn follow(ctx: &AppContext, current: &str, target: &str) -> Result<()> {
    ctx.service.follow(current, target).await?;
    print_json(&FollowOutcome {
        follower: current,
        followee: target,
        following: true,
    })
}

pub async fn unfollow(ctx: &AppContext, current: &str, target: &str) -> Result<()> {
    ctx.service.unfollow(current, target).await?;
    print_json(&FollowOutcome {
        follower: current,
        followee: target,
        following: false,
    })
}

pub async fn followers(ctx: &AppContext, email: &str) -> Result<()> {
    let users = ctx.service.load_followers(email).await?;
    print_json(&sorted(users))
}

pub async fn followings(ctx: &AppContext, email: &str) -> Result<()> {
    let users = ctx.service.load_followings(email).await?;
    print_json(&sorted(users))
}

pub async fn counts(ctx: &AppContext, email: &str) -> Result<()> {
    let user = ctx
        .service
        .load_user(email)
        .await?
        .ok_or_else(|| anyhow!("No user with email {}", email))?;

    print_json(&UserCounts {
        email,
        memos: ctx.service.get_memo_count(email).await?,
        columns: ctx.service.get_column_count(email).await?,
        followers: user.follower_count(),
        followings: user.following_count(),
    })
}

fn sorted(mut users: Vec<UserRecord>) -> Vec<UserRecord> {
    users.sort_by(|a, b| a.email.cmp(&b.email));
    users
}
