use crate::core::engine::EngineOptions;
use crate::errors::{AppError, AppResult};
use crate::models::location::WorkLocation;
use crate::utils::path::expand_tilde_str;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_location")]
    pub default_location: String,
    /// Upper bound for a single database call waiting on a lock.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_separator_char")]
    pub separator_char: String,
}

fn default_user_id() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string())
}
fn default_location() -> String {
    WorkLocation::Office.to_db_str().to_string()
}
fn default_store_timeout_ms() -> u64 {
    5_000
}
fn default_read_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    100
}
fn default_separator_char() -> String {
    "-".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            user_id: default_user_id(),
            default_location: default_location(),
            store_timeout_ms: default_store_timeout_ms(),
            read_retries: default_read_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            separator_char: default_separator_char(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rtimeclock")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rtimeclock")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtimeclock.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rtimeclock.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        let mut cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        cfg.database = expand_tilde_str(&cfg.database);
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        fs::write(path, yaml).map_err(|_| AppError::ConfigSave)
    }

    /// Create config directory, config file (unless `is_test`) and an empty
    /// database file. `custom_db` may be relative to the config directory.
    pub fn init_all(custom_db: Option<&str>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();

        // DB name: user provided or default
        let db_path = match custom_db {
            Some(name) => {
                let p = PathBuf::from(expand_tilde_str(name));
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Self::default()
        };

        // Write config file
        if !is_test {
            fs::create_dir_all(&dir)?;
            config.save_to(&Self::config_file())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);
        Ok(config)
    }

    pub fn location(&self) -> AppResult<WorkLocation> {
        WorkLocation::from_code(&self.default_location)
            .ok_or_else(|| AppError::InvalidLocation(self.default_location.clone()))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            read_retries: self.read_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn separator(&self) -> char {
        self.separator_char.chars().next().unwrap_or('-')
    }

    /// Human readable problems with the current values. Empty = valid.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.database.trim().is_empty() {
            out.push("database path is empty".to_string());
        }
        if self.user_id.trim().is_empty() {
            out.push("user_id is empty".to_string());
        }
        if self.location().is_err() {
            out.push(format!("unknown default_location '{}'", self.default_location));
        }
        if self.store_timeout_ms == 0 {
            out.push("store_timeout_ms must be greater than 0".to_string());
        }
        if self.separator_char.chars().count() != 1 {
            out.push("separator_char must be a single character".to_string());
        }
        out
    }
}
