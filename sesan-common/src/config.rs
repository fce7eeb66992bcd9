//! Configuration loading and API endpoint resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Compiled default for the analysis service endpoint
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable consulted for the service endpoint
pub const API_URL_ENV_VAR: &str = "SESAN_API_URL";

/// Client configuration
///
/// Loaded from `config.toml` in the platform config directory; every field
/// has a compiled default so a missing file is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis service
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout for the blocking analysis upload, in seconds.
    /// The analyze endpoint holds the connection for the job's full
    /// duration, so this is deliberately very high.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    /// TCP connect timeout, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Fixed interval between progress polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Path of the stored session token
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_upload_timeout_secs() -> u64 {
    1800
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_session_file() -> PathBuf {
    config_dir().join("session")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            upload_timeout_secs: default_upload_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            session_file: default_session_file(),
        }
    }
}

impl Config {
    /// Load configuration following the resolution priority order:
    /// 1. Explicit config file path (highest priority)
    /// 2. Platform config file, if present
    /// 3. Compiled defaults (fallback)
    ///
    /// The API base URL is then overridden by `SESAN_API_URL` and finally by
    /// the command-line argument when given.
    pub fn load(config_path: Option<&PathBuf>, cli_api_url: Option<&str>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match find_config_file() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        // Priority: CLI argument > environment variable > config file value
        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            config.api_base_url = url;
        }
        if let Some(url) = cli_api_url {
            config.api_base_url = url.to_string();
        }

        // Trailing slashes break path joining downstream
        while config.api_base_url.ends_with('/') {
            config.api_base_url.pop();
        }

        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
    }
}

/// Platform config directory for SESAN (`~/.config/sesan` on Linux)
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("sesan"))
        .unwrap_or_else(|| PathBuf::from(".sesan"))
}

/// Locate an existing config file
///
/// Checks the user config directory first, then `/etc/sesan/config.toml` on
/// Linux for system-wide installs.
fn find_config_file() -> Option<PathBuf> {
    let user_config = config_dir().join("config.toml");
    if user_config.exists() {
        return Some(user_config);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/sesan/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
