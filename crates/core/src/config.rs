//! Application configuration.
//!
//! Values are layered: built-in defaults, then the TOML file under the
//! user's config directory, then `GAMES_EDITOR_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::probe::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Directory under `~/.config` holding the config file.
pub const CONFIG_DIR: &str = "games-editor";
/// Name of the config file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "GAMES_EDITOR";

const DEFAULT_CONFIG: &str = r#"# games-editor configuration

# JSON file holding the game list.
data_file = "games.json"

# Where timestamped copies go before each save. Defaults to `backup`
# next to the data file.
# backup_dir = "backup"

# Seconds to wait for each URL probe.
probe_timeout_secs = 5
"#;

/// Settings shared by the core and any front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding the game list.
    pub data_file: PathBuf,
    /// Directory for backups; `None` means `backup` beside the data file.
    pub backup_dir: Option<PathBuf>,
    /// Per-request probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// User agent sent with probes.
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("games.json"),
            backup_dir: None,
            probe_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path` (optional) plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Directory receiving backups.
    pub fn backup_dir(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => dir.clone(),
            None => self
                .data_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join("backup"),
        }
    }

    /// Probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    /// Point the config at a different data file.
    pub fn with_data_file(mut self, data_file: impl Into<PathBuf>) -> Self {
        self.data_file = data_file.into();
        self
    }
}

/// Location of the config file under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

fn ensure_default_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_backup_dir_sits_beside_data_file() {
        let config = AppConfig::default().with_data_file("/srv/data/games.json");
        assert_eq!(config.backup_dir(), PathBuf::from("/srv/data/backup"));

        let relative = AppConfig::default();
        assert_eq!(relative.backup_dir(), PathBuf::from("backup"));
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "data_file = \"list.json\"\nbackup_dir = \"old\"\nprobe_timeout_secs = 2\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_file, PathBuf::from("list.json"));
        assert_eq!(config.backup_dir(), PathBuf::from("old"));
        assert_eq!(config.probe_timeout(), Duration::from_secs(2));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        Ok(())
    }

    #[test]
    fn default_config_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        ensure_default_config_at(&path)?;
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("probe_timeout_secs = 5"));

        fs::write(&path, "probe_timeout_secs = 9\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "probe_timeout_secs = 9\n");

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.probe_timeout_secs, 9);
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.data_file, AppConfig::default().data_file);
        Ok(())
    }
}
