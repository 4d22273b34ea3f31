//! Configuration for the dashboard sidecar.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    /// Path of the database file for the embedded store.
    pub database: String,
    /// Seconds to wait on a locked database before a statement fails.
    pub timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchemaConfig {
    pub bootstrap: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub schema: SchemaConfig,
}

impl AppConfig {
    /// Load configuration from an optional file and `UNIDASH_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("UNIDASH_CONFIG").unwrap_or_else(|_| "unidash".into());

        let config = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("UNIDASH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: String::new(),
            database: "university.sqlite3".to_string(),
            timeout: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self { bootstrap: true }
    }
}
