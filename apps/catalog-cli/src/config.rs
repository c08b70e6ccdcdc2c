//! Centralized configuration for catalog-cli.
//!
//! Environment variables are loaded and validated once at startup so a bad
//! connection string fails before any command runs.

use std::env;

use sqlite_adapter::{SqliteConfig, DEFAULT_DB_URL};
use thiserror::Error;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost when the process exits)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::Sqlite
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug, Error)]
#[error("Configuration error for {field}: {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: sqlite)
    pub storage_provider: StorageProvider,
    /// Parsed SQLite connection settings (from `CATALOG_DB_URL`)
    pub sqlite: SqliteConfig,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_provider = StorageProvider::from_str(
            &lookup("STORAGE_PROVIDER").unwrap_or_else(|| "sqlite".into()),
        );

        let db_url = lookup("CATALOG_DB_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_URL.into());
        let sqlite = SqliteConfig::parse(&db_url).map_err(|e| ConfigError {
            field: "CATALOG_DB_URL",
            message: e.to_string(),
        })?;

        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            storage_provider,
            sqlite,
            log_format,
        })
    }

    /// Log a hint when the chosen backend will not keep data between runs.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: products are kept in memory and lost when the command exits"
            );
        }
    }
}
