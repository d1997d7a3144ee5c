pub mod content;
pub mod graph;
pub mod user;

use anyhow::{Context, Result};
use monologue_application::FollowGraphService;
use monologue_core::config::RootConfig;
use monologue_core::store::DocumentStore;
use monologue_infrastructure::{ConfigService, JsonFileDocumentStore, MonologuePaths};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Everything a command needs, built once per invocation.
pub struct AppContext {
    pub config: RootConfig,
    pub store: Arc<dyn DocumentStore>,
    pub service: FollowGraphService,
}

impl AppContext {
    /// Loads the configuration, starts logging and opens the store.
    pub async fn open(store_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new(),
        };
        let config = config_service.get_config().await?;
        init_logging(&config.logging.level);

        let store_path = match store_path {
            Some(path) => path,
            None => MonologuePaths::default()
                .store_file()
                .context("Failed to resolve the store location")?,
        };
        if let Some(parent) = store_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let store: Arc<dyn DocumentStore> = Arc::new(JsonFileDocumentStore::open(
            &store_path,
            config.transaction.clone(),
        )?);
        tracing::debug!(store = %store_path.display(), "Store ready");

        let service = FollowGraphService::from_store(Arc::clone(&store), &config);
        Ok(Self {
            config,
            store,
            service,
        })
    }
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so stdout
/// stays machine-readable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
