use super::{AppContext, print_json};
use anyhow::Result;
use chrono::Utc;
use monologue_core::content::{Column, ColumnRepository, Memo, MemoRepository};
use monologue_core::email::validate_email;
use monologue_infrastructure::{DocumentColumnRepository, DocumentMemoRepository};
use std::sync::Arc;
use uuid::Uuid;

pub async fn add_memo(
    ctx: &AppContext,
    email: String,
    content: String,
    categories: Vec<String>,
) -> Result<()> {
    validate_email(&email)?;
    let memo = Memo {
        id: Uuid::new_v4().to_string(),
        email,
        content,
        categories: categories.into_iter().collect(),
        date: Utc::now(),
    };

    let repository =
        DocumentMemoRepository::new(Arc::clone(&ctx.store), ctx.config.collections.memos.clone());
    repository.save(&memo).await?;
    tracing::info!(id = %memo.id, email = %memo.email, "Added memo");
    print_json(&memo)
}

pub async fn add_column(
    ctx: &AppContext,
    email: String,
    title: String,
    content: String,
    categories: Vec<String>,
) -> Result<()> {
    validate_email(&email)?;
    let column = Column {
        id: Uuid::new_v4().to_string(),
        email,
        title,
        content,
        categories: categories.into_iter().collect(),
        date: Utc::now(),
    };

    let repository = DocumentColumnRepository::new(
        Arc::clone(&ctx.store),
        ctx.config.collections.columns.clone(),
    );
    repository.save(&column).await?;
    tracing::info!(id = %column.id, email = %column.email, "Added column");
    print_json(&column)
}
