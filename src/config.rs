//! Tracker configuration loaded from `process-tracker.toml`.
//!
//! Values missing from the file fall back to defaults. The environment
//! variables `PROCESS_TRACKER_STORE_DIR` and `PROCESS_TRACKER_COMPANY_ID`
//! take precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::webhook::{WebhookEndpoints, default_client_id};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = "process-tracker.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Tenant owning the processes this tracker touches.
    #[serde(default)]
    pub company_id: i64,

    /// Owner plugin recorded on newly created processes.
    #[serde(default)]
    pub plugin_id: i64,

    /// Directory holding one JSON file per process.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Value of the `X-Client-Id` header on webhook calls.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Webhook endpoints; notifications are disabled when absent.
    #[serde(default)]
    pub webhooks: Option<WebhookEndpoints>,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".process-tracker")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            company_id: 0,
            plugin_id: 0,
            store_dir: default_store_dir(),
            client_id: default_client_id(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            webhooks: None,
        }
    }
}

impl TrackerConfig {
    /// Loads `path`, or `process-tracker.toml` in the working directory when
    /// no path is given. A missing default file yields the defaults; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<TrackerConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = var("PROCESS_TRACKER_STORE_DIR")
            && !dir.is_empty()
        {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(company) = var("PROCESS_TRACKER_COMPANY_ID")
            && !company.is_empty()
        {
            self.company_id = company
                .parse()
                .with_context(|| format!("PROCESS_TRACKER_COMPANY_ID is not an integer: {company}"))?;
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
