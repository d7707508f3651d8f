//! TaskJournal configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::PlayerId;

/// Main TaskJournal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity tag stamped on broadcast messages
    #[serde(rename = "mod-id")]
    pub mod_id: String,

    /// Log level used when none is given on the command line
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    pub storage: StorageConfig,

    pub session: SessionConfig,

    pub catalog: CatalogConfig,

    /// Presentation settings
    pub journal: JournalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mod_id: "taskjournal".to_string(),
            log_level: None,
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            catalog: CatalogConfig::default(),
            journal: JournalConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .taskjournal.yml
        let local_config = PathBuf::from(".taskjournal.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/taskjournal/taskjournal.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskjournal").join("taskjournal.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Directory the task data store lives in
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone()
    }

    /// Directory for log files
    pub fn log_dir(&self) -> PathBuf {
        self.storage.data_dir.join("logs")
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: journalstore::default_data_dir(),
        }
    }
}

/// Save and player used when the command line names none
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(rename = "save-id")]
    pub save_id: String,

    #[serde(rename = "player-id")]
    pub player_id: i64,
}

impl SessionConfig {
    pub fn player(&self) -> PlayerId {
        PlayerId(self.player_id)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_id: "default".to_string(),
            player_id: 1,
        }
    }
}

/// Game data source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// YAML catalog file; the built-in data is used when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Mark completed tasks with a check in listings
    #[serde(rename = "enable-visual-task-complete-indicator")]
    pub enable_visual_task_complete_indicator: bool,

    /// Net sale earnings against purchase costs in the money total
    #[serde(rename = "money-view-net-wealth")]
    pub money_view_net_wealth: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enable_visual_task_complete_indicator: true,
            money_view_net_wealth: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.mod_id, "taskjournal");
        assert!(config.log_level.is_none());
        assert_eq!(config.session.save_id, "default");
        assert_eq!(config.session.player(), PlayerId(1));
        assert!(config.catalog.path.is_none());
        assert!(config.journal.enable_visual_task_complete_indicator);
        assert!(!config.journal.money_view_net_wealth);
        assert!(config.log_dir().ends_with("logs"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
mod-id: farmhands
session:
  player-id: 42
journal:
  money-view-net-wealth: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mod_id, "farmhands");
        assert_eq!(config.session.player_id, 42);
        assert_eq!(config.session.save_id, "default");
        assert!(config.journal.money_view_net_wealth);
        assert!(config.journal.enable_visual_task_complete_indicator);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yml");
        fs::write(
            &path,
            "log-level: debug\nstorage:\n  data-dir: /tmp/journal\ncatalog:\n  path: data.yml\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/journal"));
        assert_eq!(config.catalog.path, Some(PathBuf::from("data.yml")));
    }

    #[test]
    fn test_load_explicit_path_missing_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_load_project_local_config() {
        let temp = TempDir::new().unwrap();
        let original = std::env::current_dir().unwrap();
        fs::write(temp.path().join(".taskjournal.yml"), "session:\n  save-id: Farm_9\n").unwrap();

        std::env::set_current_dir(temp.path()).unwrap();
        let result = Config::load(None);
        std::env::set_current_dir(original).unwrap();

        assert_eq!(result.unwrap().session.save_id, "Farm_9");
    }

    #[test]
    #[serial]
    fn test_load_invalid_local_config_falls_through() {
        let temp = TempDir::new().unwrap();
        let original = std::env::current_dir().unwrap();
        fs::write(temp.path().join(".taskjournal.yml"), "session: [not, a, map]\n").unwrap();

        std::env::set_current_dir(temp.path()).unwrap();
        let result = Config::load(None);
        std::env::set_current_dir(original).unwrap();

        assert!(result.is_ok());
    }
}
