//! Layered configuration: built-in defaults, then `config.json`, then
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::auth::AdminCredential;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "REWORK_CONFIG";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the database and log file. Defaults to the
    /// platform data directory.
    pub data_dir: Option<PathBuf>,
    pub database_file: String,
    /// Root of the date-partitioned backup folders. Defaults to
    /// `<data_dir>/backups`.
    pub backup_dir: Option<PathBuf>,
    /// `env_logger` filter string, e.g. `info` or `pcb_rework_tracker=debug`.
    pub log_level: String,
    pub log_file: String,
    pub bcrypt_cost: u32,
    pub admin_username: String,
    /// bcrypt hash of the admin password. Admin login stays disabled until
    /// this is set.
    pub admin_password_hash: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: "rework_data.db".to_string(),
            backup_dir: None,
            log_level: "info".to_string(),
            log_file: "rework.log".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_username: "admin".to_string(),
            admin_password_hash: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides. A
    /// missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self).context("failed to encode config")?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }

    /// Apply `REWORK_*` overrides through `lookup` so tests can feed values
    /// without touching the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("REWORK_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("REWORK_BACKUP_DIR") {
            self.backup_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup("REWORK_LOG") {
            self.log_level = level;
        }
        if let Some(user) = lookup("REWORK_ADMIN_USER") {
            self.admin_username = user;
        }
        if let Some(hash) = lookup("REWORK_ADMIN_PASSWORD_HASH") {
            self.admin_password_hash = Some(hash);
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.database_file))
    }

    pub fn backup_root(&self) -> Result<PathBuf> {
        match &self.backup_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("backups")),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.log_file))
    }

    pub fn admin_credential(&self) -> AdminCredential {
        AdminCredential {
            username: self.admin_username.clone(),
            password_hash: self
                .admin_password_hash
                .clone()
                .filter(|hash| !hash.trim().is_empty()),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "pcb-rework")
        .ok_or_else(|| anyhow!("could not locate home directory"))
}
