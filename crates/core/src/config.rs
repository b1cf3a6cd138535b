//! Application configuration.
//!
//! Values are layered: built-in defaults, then `~/.config/badgetrack/config.toml`,
//! then `BADGETRACK_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Location of the config file relative to the user's config directory.
pub const CONFIG_FILE: &str = "badgetrack/config.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "BADGETRACK";

const DEFAULT_CONFIG: &str = r#"# badgetrack configuration

# Directory holding the tracked-game list and logs.
# data_dir = "/home/me/.local/share/badgetrack"

# Slot name of the persisted tracked-game list.
storage_key = "robloxTrackedGames"

games_api_url = "https://games.roblox.com"
users_api_url = "https://api.roblox.com"
badges_api_url = "https://badges.roblox.com"

request_timeout_secs = 15
"#;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the persisted slot and logs.
    pub data_dir: PathBuf,
    /// Slot name of the persisted tracked-game list.
    pub storage_key: String,
    /// Base URL of the game metadata service.
    pub games_api_url: String,
    /// Base URL of the username lookup service.
    pub users_api_url: String,
    /// Base URL of the badge service.
    pub badges_api_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: "robloxTrackedGames".to_string(),
            games_api_url: "https://games.roblox.com".to_string(),
            users_api_url: "https://api.roblox.com".to_string(),
            badges_api_url: "https://badges.roblox.com".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from a specific file (which may be absent) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Default config file path under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE)
}

/// Default data directory under the user's data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("badgetrack")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.storage_key, "robloxTrackedGames");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/config.toml");
        write_default_config(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.badges_api_url, "https://badges.roblox.com");
        assert_eq!(config.data_dir, default_data_dir());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = \"/tmp/badges\"\nrequest_timeout_secs = 3\nstorage_key = \"alt\"\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/badges"));
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.storage_key, "alt");
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/badges/logs"));
        Ok(())
    }
}
