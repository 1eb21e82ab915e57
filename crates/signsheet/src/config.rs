//! Configuration management for signsheet.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::roster::Baseline;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "signsheet";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "signsheet.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SIGNSHEET_";

/// Storage key holding drivers added on the device.
pub const DEFAULT_DRIVERS_KEY: &str = "driver-staff-lookup-extra-drivers";

/// Storage key holding every attendance record.
pub const DEFAULT_RECORDS_KEY: &str = "staff-safety-records-v1";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SIGNSHEET_`, sections split on
///    `__`, e.g. `SIGNSHEET_STORAGE__DATABASE_PATH`)
/// 2. TOML config file at `~/.config/signsheet/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Roster configuration.
    pub roster: RosterConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/signsheet/signsheet.db`
    pub database_path: Option<PathBuf>,
    /// Key under which device-added drivers are stored.
    pub drivers_key: String,
    /// Key under which attendance records are stored.
    pub records_key: String,
}

/// Roster-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Replacement baseline roster file, one `Name StaffNumber` per line.
    /// The shipped roster is used when unset.
    pub baseline_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            drivers_key: DEFAULT_DRIVERS_KEY.to_string(),
            records_key: DEFAULT_RECORDS_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration, reading `config_path` or the default file.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `SIGNSHEET_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let config = Self::figment(&config_file).extract::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        for (name, key) in [
            ("drivers_key", &self.storage.drivers_key),
            ("records_key", &self.storage.records_key),
        ] {
            if key.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("storage.{name} must not be empty"),
                });
            }
        }

        if self.storage.drivers_key == self.storage.records_key {
            return Err(Error::ConfigValidation {
                message: format!(
                    "storage.drivers_key and storage.records_key must differ (both are {:?})",
                    self.storage.drivers_key
                ),
            });
        }

        if let Some(path) = &self.roster.baseline_path {
            if !path.is_file() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "roster.baseline_path does not exist: {}",
                        path.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Load the baseline roster: the configured file, or the shipped list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BaselineLoad`] if the configured file cannot be read
    /// or parsed.
    pub fn baseline(&self) -> Result<Baseline> {
        match &self.roster.baseline_path {
            Some(path) => Baseline::from_file(path),
            None => Ok(Baseline::shipped()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "signsheet_config_{}_{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.storage.drivers_key, DEFAULT_DRIVERS_KEY);
        assert_eq!(config.storage.records_key, DEFAULT_RECORDS_KEY);
        assert!(config.roster.baseline_path.is_none());
    }

    #[test]
    fn test_default_keys_match_device_storage() {
        assert_eq!(DEFAULT_DRIVERS_KEY, "driver-staff-lookup-extra-drivers");
        assert_eq!(DEFAULT_RECORDS_KEY, "staff-safety-records-v1");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_key() {
        let mut config = Config::default();
        config.storage.records_key = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("records_key"));
    }

    #[test]
    fn test_validate_same_keys() {
        let mut config = Config::default();
        config.storage.records_key = config.storage.drivers_key.clone();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_missing_baseline_file() {
        let mut config = Config::default();
        config.roster.baseline_path = Some(PathBuf::from("/nonexistent/roster.txt"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("baseline_path"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("signsheet.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("signsheet"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("signsheet"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = temp_file(
            "load.toml",
            "[storage]\ndatabase_path = \"/tmp/depot.db\"\nrecords_key = \"records-test\"\n",
        );

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/depot.db"));
        assert_eq!(config.storage.records_key, "records-test");
        assert_eq!(config.storage.drivers_key, DEFAULT_DRIVERS_KEY);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_toml_file() {
        let path = temp_file(
            "invalid.toml",
            "[storage]\ndrivers_key = \"same\"\nrecords_key = \"same\"\n",
        );

        let err = Config::load_from(Some(path.clone())).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_baseline_shipped_by_default() {
        let config = Config::default();
        assert_eq!(config.baseline().unwrap().len(), Baseline::shipped().len());
    }

    #[test]
    fn test_baseline_from_configured_file() {
        let path = temp_file("roster.txt", "Ann Other 1\nBob Smith 2\n");
        let mut config = Config::default();
        config.roster.baseline_path = Some(path.clone());

        assert!(config.validate().is_ok());
        assert_eq!(config.baseline().unwrap().len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_storage_config_serialize() {
        let storage = StorageConfig::default();
        let json = serde_json::to_string(&storage).unwrap();
        assert!(json.contains("records_key"));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"drivers_key": "extra"}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.drivers_key, "extra");
        assert_eq!(storage.records_key, DEFAULT_RECORDS_KEY);
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }
}
