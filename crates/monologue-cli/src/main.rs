use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "monologue")]
#[command(about = "Monologue CLI - user records and the follow graph", long_about = None)]
struct Cli {
    /// JSON store file (defaults to the platform data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, show or edit user records
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Make one user follow another
    Follow { current: String, target: String },
    /// Make one user stop following another
    Unfollow { current: String, target: String },
    /// List the users following EMAIL
    Followers { email: String },
    /// List the users EMAIL follows
    Followings { email: String },
    /// Show memo, column and follow counts of a user
    Counts { email: String },
    /// Post memos
    Memo {
        #[command(subcommand)]
        action: MemoAction,
    },
    /// Post columns
    Column {
        #[command(subcommand)]
        action: ColumnAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user record
    Create {
        email: String,
        nickname: String,
        #[arg(long, default_value = "")]
        introduction: String,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
    },
    /// Print a user record
    Show { email: String },
    /// Update profile fields of a user record
    Update {
        email: String,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        introduction: Option<String>,
        #[arg(long)]
        profile_image: Option<String>,
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,
    },
}

#[derive(Subcommand)]
enum MemoAction {
    /// Add a memo owned by EMAIL
    Add {
        email: String,
        content: String,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ColumnAction {
    /// Add a column owned by EMAIL
    Add {
        email: String,
        title: String,
        content: String,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = commands::AppContext::open(cli.store, cli.config).await?;

    match cli.command {
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                nickname,
                introduction,
                categories,
            } => commands::user::create(&ctx, email, nickname, introduction, categories).await?,
            UserAction::Show { email } => commands::user::show(&ctx, &email).await?,
            UserAction::Update {
                email,
                nickname,
                introduction,
                profile_image,
                categories,
            } => {
                let patch = commands::user::build_patch(
                    nickname,
                    introduction,
                    profile_image,
                    categories,
                );
                commands::user::update(&ctx, &email, patch).await?
            }
        },
        Commands::Follow { current, target } => {
            commands::graph::follow(&ctx, &current, &target).await?
        }
        Commands::Unfollow { current, target } => {
            commands::graph::unfollow(&ctx, &current, &target).await?
        }
        Commands::Followers { email } => commands::graph::followers(&ctx, &email).await?,
        Commands::Followings { email } => commands::graph::followings(&ctx, &email).await?,
        Commands::Counts { email } => commands::graph::counts(&ctx, &email).await?,
        Commands::Memo { action } => match action {
            MemoAction::Add {
                email,
                content,
                categories,
            } => commands::content::add_memo(&ctx, email, content, categories).await?,
        },
        Commands::Column { action } => match action {
            ColumnAction::Add {
                email,
                title,
                content,
                categories,
            } => commands::content::add_column(&ctx, email, title, content, categories).await?,
        },
    }

    Ok(())
}
