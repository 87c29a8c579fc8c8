//! Configuration file support for Vitals.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/vitals/config.toml`.
//! Every section is optional.

use crate::{
    predict::{DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name, relative to `data_dir` unless absolute
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: default_database(),
        }
    }
}

/// Backup/export/import file locations
///
/// Relative paths are resolved against the data directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_backup_file")]
    pub backup_file: PathBuf,

    #[serde(default = "default_export_file")]
    pub export_file: PathBuf,

    #[serde(default = "default_import_file")]
    pub import_file: PathBuf,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            backup_file: default_backup_file(),
            export_file: default_export_file(),
            import_file: default_import_file(),
        }
    }
}

/// Weight projection parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
        }
    }
}

// Default value functions
fn home_or_current() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_or_current().join(".local/share"));
    base.join("vitals")
}

fn default_database() -> PathBuf {
    PathBuf::from("vitals.db")
}

fn default_backup_file() -> PathBuf {
    PathBuf::from("weight_data_backup.csv")
}

fn default_export_file() -> PathBuf {
    PathBuf::from("weight_data_export.csv")
}

fn default_import_file() -> PathBuf {
    PathBuf::from("weight_data_import.csv")
}

fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_or_current().join(".config"));
        base.join("vitals").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.data.database.as_os_str().is_empty() {
            return Err(Error::Config("data.database must not be empty".into()));
        }
        if self.prediction.horizon_days > MAX_HORIZON_DAYS {
            return Err(Error::Config(format!(
                "prediction.horizon_days must be at most {}",
                MAX_HORIZON_DAYS
            )));
        }
        Ok(())
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.data.database)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.resolve(&self.transfer.backup_file)
    }

    pub fn export_path(&self) -> PathBuf {
        self.resolve(&self.transfer.export_file)
    }

    pub fn import_path(&self) -> PathBuf {
        self.resolve(&self.transfer.import_file)
    }

    /// Anchor relative paths at the data directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data.data_dir.join(path)
        }
    }
}
