use crate::catalog::{DEFAULT_ACTIVE_LOG, DEFAULT_UPGRADE_PATTERN};
use crate::service::DEFAULT_RESTART_TIMEOUT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,

    #[serde(default)]
    pub policy: Policy,

    #[serde(default)]
    pub service: Service,

    #[serde(default)]
    pub store: Store,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Defaults to `<base_dir>/1panel/backup` when unset
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Glob matched against upgrade package directory names
    #[serde(default = "default_upgrade_pattern")]
    pub upgrade_pattern: String,

    #[serde(default = "default_active_log")]
    pub active_log: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_restart_command")]
    pub restart_command: Vec<String>,

    /// Seconds the restart command may run before it is killed
    #[serde(default = "default_restart_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    /// Defaults to `<base_dir>/1panel/db/clean.db` when unset
    #[serde(default)]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            backup_dir: None,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            upgrade_pattern: default_upgrade_pattern(),
            active_log: default_active_log(),
        }
    }
}

impl Default for Service {
    fn default() -> Self {
        Self {
            enabled: true,
            restart_command: default_restart_command(),
            timeout_secs: default_restart_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_base_dir() -> PathBuf { PathBuf::from("/opt") }
fn default_upgrade_pattern() -> String { DEFAULT_UPGRADE_PATTERN.to_string() }
fn default_active_log() -> String { DEFAULT_ACTIVE_LOG.to_string() }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_restart_timeout() -> u64 { DEFAULT_RESTART_TIMEOUT.as_secs() }
fn default_restart_command() -> Vec<String> {
    vec![
        "systemctl".to_string(),
        "restart".to_string(),
        "1panel.service".to_string(),
    ]
}

impl Config {
    /// Get the default config file path, e.g. ~/.config/panel-clean/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "panel-clean")
            .context("Could not determine a configuration directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load config from an explicit file, or from the default location.
    ///
    /// An explicit file must exist and parse. The default location falls
    /// back to built-in defaults when missing or unreadable.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        match Self::config_path() {
            Ok(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {:#}", e);
                    Ok(Self::default())
                }
            },
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply CLI option overrides
    pub fn apply_cli_overrides(&mut self, base_dir: Option<PathBuf>, backup_dir: Option<PathBuf>) {
        if let Some(dir) = base_dir {
            self.paths.base_dir = dir;
        }
        if let Some(dir) = backup_dir {
            self.paths.backup_dir = Some(dir);
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.paths.base_dir.clone()
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.paths
            .backup_dir
            .clone()
            .unwrap_or_else(|| self.paths.base_dir.join("1panel/backup"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.store
            .database
            .clone()
            .unwrap_or_else(|| self.paths.base_dir.join("1panel/db/clean.db"))
    }
}
