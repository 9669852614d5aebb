//! Persistent watcher settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings read from `settings.json` in the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// User whose drafts are watched.
    pub user_id: Option<String>,
    /// Draft state database (defaults to the data directory).
    pub database_path: Option<PathBuf>,
    /// Show a desktop notification for each sending outcome.
    pub desktop_notifications: bool,
    /// Milliseconds between checks for writes made by other processes.
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: None,
            database_path: None,
            desktop_notifications: true,
            poll_interval_ms: 1000,
        }
    }
}

impl Settings {
    /// Database path, falling back to `<data_dir>/outbox/outbox.db`.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("outbox")
                .join("outbox.db")
        })
    }

    /// Interval between database polls, at least 10ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

/// Location of the settings file.
pub fn path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("outbox")
        .join("settings.json")
}

/// Load settings from the default location.
pub async fn load() -> Result<Settings> {
    load_from(&path()).await
}

/// Load settings from `settings_path`, using defaults if it does not exist.
pub async fn load_from(settings_path: &Path) -> Result<Settings> {
    if !settings_path.exists() {
        return Ok(Settings::default());
    }

    let contents = tokio::fs::read_to_string(settings_path)
        .await
        .with_context(|| format!("reading {}", settings_path.display()))?;

    let settings = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", settings_path.display()))?;

    tracing::debug!("Settings loaded from {:?}", settings_path);
    Ok(settings)
}
