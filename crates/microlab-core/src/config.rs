//! Core runtime configuration.
//!
//! Resolved once at startup and passed into the core. Nothing below the FFI
//! layer reads environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::db::{Database, DbResult};

/// Environment variable naming the SQLite file. Unset means in-memory.
pub const DATABASE_PATH_ENV: &str = "MICROLAB_DATABASE_PATH";
/// Environment variable holding the `tracing` filter directives.
pub const LOG_FILTER_ENV: &str = "MICROLAB_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidLogFilter { filter: String, reason: String },

    #[error("Database path must not be blank")]
    BlankDatabasePath,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: Option<PathBuf>,
    log_filter: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`. The log filter is parsed up front.
    pub fn new(database_path: Option<PathBuf>, log_filter: impl Into<String>) -> Result<Self, ConfigError> {
        if database_path
            .as_deref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::BlankDatabasePath);
        }

        let log_filter = log_filter.into();
        EnvFilter::try_new(&log_filter).map_err(|error| ConfigError::InvalidLogFilter {
            filter: log_filter.clone(),
            reason: error.to_string(),
        })?;

        Ok(Self {
            database_path,
            log_filter,
        })
    }

    /// In-memory database with the default log filter.
    pub fn in_memory() -> Self {
        Self {
            database_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Read `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_path = std::env::var_os(DATABASE_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let log_filter =
            std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self::new(database_path, log_filter)
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Open the configured database, creating the schema if needed.
    pub fn open_database(&self) -> DbResult<Database> {
        match &self.database_path {
            Some(path) => Database::open(path),
            None => Database::open_in_memory(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
