//! # Configuration Module
//!
//! Data directory setup and the runtime configuration assembled from
//! command-line arguments and environment variables.
//!
//! ## Data Storage
//!
//! The store database lives in the platform-standard data directory:
//! - Linux: `~/.local/share/moodtune/store.db`
//! - macOS: `~/Library/Application Support/moodtune/store.db`
//! - Windows: `%APPDATA%\moodtune\store.db`

use crate::app::StaleResultPolicy;
use crate::client::GeminiConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "moodtune";
const STORE_FILE: &str = "store.db";

/// Returns the platform-appropriate data directory for Moodtune, creating it
/// if needed.
///
/// # Errors
///
/// Fails if the system data directory cannot be determined or the
/// `moodtune` subdirectory cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Pass --data-dir to choose one."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    ensure_dir(&app_dir)?;
    Ok(app_dir)
}

/// Store database path inside `data_dir`.
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "Failed to create Moodtune data directory at {}. Please check file permissions.",
            dir.display()
        )
    })
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding the store database
    pub data_dir: PathBuf,
    /// Keep everything in memory instead of on disk
    pub ephemeral: bool,
    /// What to do with outcomes that arrive after the user navigated away
    pub stale_results: StaleResultPolicy,
    pub gemini: GeminiConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: get_data_dir().unwrap_or_else(|_| PathBuf::from(".")),
            ephemeral: false,
            stale_results: StaleResultPolicy::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Configuration rooted at `data_dir` (or the platform default), creating
    /// the directory.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => {
                ensure_dir(&dir)?;
                dir
            }
            None => get_data_dir()?,
        };

        Ok(Self {
            data_dir,
            ephemeral: false,
            stale_results: StaleResultPolicy::default(),
            gemini: GeminiConfig::default(),
        })
    }

    pub fn store_path(&self) -> PathBuf {
        store_path(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("moodtune");

        let config = RuntimeConfig::new(Some(dir.clone())).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.store_path(), dir.join("store.db"));
    }

    #[test]
    fn test_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = RuntimeConfig::new(Some(temp.path().to_path_buf())).unwrap();
        assert!(!config.ephemeral);
        assert_eq!(config.stale_results, StaleResultPolicy::Discard);
        assert_eq!(config.gemini.model, crate::client::DEFAULT_MODEL);
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = RuntimeConfig::new(Some(temp.path().to_path_buf())).unwrap();
        config.gemini.api_key = Some("secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
