//! Configuration of the ORM handler
//!
//! This module provides the database connection settings, the SQL dialect,
//! the DDL policy and the logging options.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, Result};
use crate::schema::Orm2ddlPolicy;

/// URL of a private in-memory database
pub const MEMORY_URL: &str = ":memory:";

/// SQL dialect of the generated statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialectKind {
    /// SQLite, the executed dialect
    Sqlite,

    /// PostgreSQL statement text
    PostgreSql,

    /// ANSI SQL statement text
    Ansi,
}

impl Default for DialectKind {
    fn default() -> Self {
        DialectKind::Sqlite
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// File path of the database or `:memory:`
    pub url: String,

    /// Whether to enforce foreign keys
    pub foreign_keys: bool,

    /// How long to wait for a locked database
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: MEMORY_URL.to_string(),
            foreign_keys: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    /// Is the database kept in memory
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_URL
    }
}

/// ORM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrmConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// SQL dialect
    pub dialect: DialectKind,

    /// Default DDL policy of all tables
    pub ddl_policy: Orm2ddlPolicy,

    /// Whether to log every SQL statement on the debug level
    pub log_sql: bool,

    /// Log filter used by `init_logger`
    pub log_level: String,
}

impl Default for OrmConfig {
    fn default() -> Self {
        OrmConfig {
            database: DatabaseConfig::default(),
            dialect: DialectKind::default(),
            ddl_policy: Orm2ddlPolicy::CreateOrUpdateDdl,
            log_sql: false,
            log_level: "info".to_string(),
        }
    }
}

impl OrmConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration of a database file
    pub fn with_url(url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.database.url = url.into();
        config
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.log_sql = true;
        config.log_level = "debug".to_string();
        config
    }

    /// Create a production configuration
    pub fn production() -> Self {
        let mut config = Self::default();
        config.ddl_policy = Orm2ddlPolicy::Validate;
        config.log_sql = false;
        config.log_level = "info".to_string();
        config
    }

    /// Create a testing configuration
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.database.url = MEMORY_URL.to_string();
        config.database.busy_timeout = Duration::from_secs(1);
        config.ddl_policy = Orm2ddlPolicy::CreateDdl;
        config.log_sql = true;
        config.log_level = "debug".to_string();
        config
    }

    /// Check the values
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(OrmError::Config("Database url must not be empty".to_string()));
        }
        if self.ddl_policy == Orm2ddlPolicy::Inherited {
            return Err(OrmError::Config(
                "Inherited is not allowed as the handler DDL policy".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize `env_logger` by the log level, `false` if a logger exists
    pub fn init_logger(&self) -> bool {
        env_logger::Builder::from_env(
            env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, &self.log_level),
        )
        .try_init()
        .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = OrmConfig::default();

        assert!(config.database.is_memory());
        assert!(config.database.foreign_keys);
        assert_eq!(config.dialect, DialectKind::Sqlite);
        assert_eq!(config.ddl_policy, Orm2ddlPolicy::CreateOrUpdateDdl);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let config = OrmConfig::development();
        assert!(config.log_sql);
        assert_eq!(config.log_level, "debug");

        let config = OrmConfig::production();
        assert_eq!(config.ddl_policy, Orm2ddlPolicy::Validate);
        assert!(!config.log_sql);

        let config = OrmConfig::testing();
        assert_eq!(config.ddl_policy, Orm2ddlPolicy::CreateDdl);
        assert_eq!(config.database.busy_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = OrmConfig::with_url(" ");
        assert!(matches!(config.validate(), Err(OrmError::Config(_))));

        config.database.url = "db.sqlite".to_string();
        config.ddl_policy = Orm2ddlPolicy::Inherited;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_io() {
        let mut config = OrmConfig::development();
        config.dialect = DialectKind::PostgreSql;

        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        let loaded = OrmConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.dialect, DialectKind::PostgreSql);
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.database.busy_timeout, config.database.busy_timeout);
    }

    #[test]
    fn test_missing_file() {
        let result = OrmConfig::from_file("/nonexistent/ujorm.json");
        assert!(matches!(result, Err(OrmError::Io(_))));
    }
}
