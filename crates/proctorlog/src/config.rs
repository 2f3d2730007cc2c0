//! Configuration management for proctorlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "proctorlog";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "PROCTORLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PROCTORLOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/proctorlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
}

/// Which persistence mechanism backs the record store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One pretty-printed JSON array file per collection.
    #[default]
    Json,
    /// A single `SQLite` database.
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persistence backend.
    pub backend: StorageBackend,
    /// Directory holding the data files.
    /// Defaults to the current working directory.
    pub data_dir: Option<PathBuf>,
    /// File name of the students collection (json backend).
    pub students_file: String,
    /// File name of the proctoring log collection (json backend).
    pub logs_file: String,
    /// File name of the database (sqlite backend).
    pub database_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_dir: None,
            students_file: "students.json".to_string(),
            logs_file: "proctoring_logs.json".to_string(),
            database_file: "proctorlog.db".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("server.host is not an IP address: {}", self.server.host),
            });
        }

        for (key, value) in [
            ("storage.students_file", &self.storage.students_file),
            ("storage.logs_file", &self.storage.logs_file),
            ("storage.database_file", &self.storage.database_file),
        ] {
            if value.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{key} must not be empty"),
                });
            }
        }

        if self.storage.students_file == self.storage.logs_file {
            return Err(Error::ConfigValidation {
                message: format!(
                    "storage.students_file and storage.logs_file must differ (both are {})",
                    self.storage.students_file
                ),
            });
        }

        Ok(())
    }

    /// Load and validate an explicit config file.
    ///
    /// Unlike [`Config::load_from`], a missing file is an error here.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be parsed, or
    /// holds invalid values.
    pub fn check_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigValidation {
                message: format!("config file not found: {}", path.display()),
            });
        }
        Self::load_from(Some(path.to_path_buf()))
    }

    /// Socket address the server binds to.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.server.host.parse().map_err(|_| Error::ConfigValidation {
            message: format!("server.host is not an IP address: {}", self.server.host),
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path of the students collection file.
    #[must_use]
    pub fn students_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.students_file)
    }

    /// Path of the proctoring log collection file.
    #[must_use]
    pub fn logs_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.logs_file)
    }

    /// Path of the `SQLite` database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_default_file_names() {
        let storage = StorageConfig::default();

        assert_eq!(storage.students_file, "students.json");
        assert_eq!(storage.logs_file, "proctoring_logs.json");
        assert_eq!(storage.database_file, "proctorlog.db");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.port"));
    }

    #[test]
    fn test_validate_bad_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.host"));
    }

    #[test]
    fn test_validate_empty_file_name() {
        let mut config = Config::default();
        config.storage.logs_file = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("storage.logs_file"));
    }

    #[test]
    fn test_validate_same_collection_files() {
        let mut config = Config::default();
        config.storage.logs_file = config.storage.students_file.clone();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("must differ"));
    }

    #[test]
    fn test_check_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::check_file(&dir.path().join("absent.toml"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("config file not found"));
    }

    #[test]
    fn test_check_file_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nlogs_file = \"students.json\"\n").unwrap();

        assert!(Config::check_file(&path).is_err());
    }

    #[test]
    fn test_check_file_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8100\n").unwrap();

        assert_eq!(Config::check_file(&path).unwrap().server.port, 8100);
    }

    #[test]
    fn test_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9000;

        assert_eq!(
            config.bind_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_paths_default_to_working_dir() {
        let config = Config::default();

        assert_eq!(config.students_path(), PathBuf::from("./students.json"));
        assert_eq!(config.logs_path(), PathBuf::from("./proctoring_logs.json"));
        assert_eq!(config.database_path(), PathBuf::from("./proctorlog.db"));
    }

    #[test]
    fn test_paths_custom_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/var/lib/proctorlog"));

        assert_eq!(
            config.students_path(),
            PathBuf::from("/var/lib/proctorlog/students.json")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("proctorlog"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9123\n\n[storage]\nbackend = \"sqlite\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_storage_backend_deserialize() {
        let storage: StorageConfig = serde_json::from_str(r#"{"backend": "sqlite"}"#).unwrap();
        assert_eq!(storage.backend, StorageBackend::Sqlite);
        assert_eq!(storage.students_file, "students.json");
    }

    #[test]
    fn test_storage_backend_display() {
        assert_eq!(StorageBackend::Json.to_string(), "json");
        assert_eq!(StorageBackend::Sqlite.to_string(), "sqlite");
    }
}
