//! Path resolution for Monologue files.
//!
//! ```text
//! ~/.config/monologue/         # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/monologue/    # Data directory
//! └── store.json               # JSON document store used by the CLI
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "monologue";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves Monologue paths, optionally under a custom base directory.
#[derive(Debug, Clone, Default)]
pub struct MonologuePaths {
    base_dir: Option<PathBuf>,
}

impl MonologuePaths {
    /// `base_dir` replaces both the platform config and data directories
    /// (used by tests).
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn store_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("store.json"))
    }
}
