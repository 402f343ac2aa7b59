//! Configuration management for the students service
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Environment variable overriding `connection.uri`.
pub const ENV_URI: &str = "STUDENTS_URI";
/// Environment variable overriding `connection.database`.
pub const ENV_DATABASE: &str = "STUDENTS_DATABASE";
/// Environment variable overriding `connection.collection`.
pub const ENV_COLLECTION: &str = "STUDENTS_COLLECTION";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "STUDENTS_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection URI
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding the students collection
    #[serde(default = "default_database")]
    pub database: String,

    /// Students collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Number of retry attempts on connection failure
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Maximum pool size
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,

    /// Minimum pool size
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Display and output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (json, json-pretty, table)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Border style for table output (modern, ascii, psql)
    #[serde(default = "default_table_style")]
    pub table_style: TableStyle,

    /// Maximum table column width before cells wrap
    #[serde(default = "default_max_column_width")]
    pub max_column_width: usize,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Compact single-line JSON
    Json,

    /// Indented JSON
    JsonPretty,

    /// ASCII table, one row per record
    Table,
}

/// Table border styles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// Box-drawing characters
    Modern,
    /// Basic ASCII characters
    Ascii,
    /// PostgreSQL client style
    Psql,
}

// Default value functions
fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "college".to_string()
}

fn default_collection() -> String {
    "students".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_max_pool_size() -> u32 {
    10
}

fn default_min_pool_size() -> u32 {
    2
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_table_style() -> TableStyle {
    TableStyle::Modern
}

fn default_max_column_width() -> usize {
    40
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            collection: default_collection(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            max_pool_size: default_max_pool_size(),
            min_pool_size: default_min_pool_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            table_style: default_table_style(),
            max_column_width: default_max_column_width(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from a file
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present, and built-in defaults otherwise.
    ///
    /// # Arguments
    /// * `path` - Optional path to the configuration file (TOML format)
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.display().to_string()).into());
                }
                path.to_path_buf()
            }
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&text)
    }

    /// Apply environment variable overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using a custom variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(ENV_URI) {
            self.connection.uri = uri;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.connection.database = database;
        }
        if let Some(collection) = lookup(ENV_COLLECTION) {
            self.connection.collection = collection;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).and_then(|v| v.parse().ok()) {
            self.logging.level = level;
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".students")
            .join("config.toml")
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let conn = &self.connection;
        conn.validate_uri()?;

        if conn.database.trim().is_empty() {
            return Err(invalid("connection.database", &conn.database));
        }
        if conn.collection.trim().is_empty() {
            return Err(invalid("connection.collection", &conn.collection));
        }
        if conn.timeout == 0 {
            return Err(invalid("connection.timeout", &conn.timeout.to_string()));
        }
        if conn.max_pool_size == 0 {
            return Err(invalid(
                "connection.max_pool_size",
                &conn.max_pool_size.to_string(),
            ));
        }
        if conn.min_pool_size > conn.max_pool_size {
            return Err(invalid(
                "connection.min_pool_size",
                &conn.min_pool_size.to_string(),
            ));
        }
        if self.display.max_column_width == 0 {
            return Err(invalid("display.max_column_width", "0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> crate::error::StudentsError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl ConnectionConfig {
    /// Check the URI scheme
    pub fn validate_uri(&self) -> Result<()> {
        if self.uri.starts_with("mongodb://") || self.uri.starts_with("mongodb+srv://") {
            Ok(())
        } else {
            Err(invalid("connection.uri", &self.uri))
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "table" => Ok(OutputFormat::Table),
            _ => Err(ConfigError::InvalidValue {
                field: "display.format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
