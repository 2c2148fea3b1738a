//! Configuration management
//!
//! This module handles loading and parsing configuration for the Newsroom site.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// News listing and comment moderation
    #[serde(default)]
    pub news: NewsConfig,
    /// Login session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Template override configuration
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/newsroom.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// News listing and comment moderation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Maximum number of news items on the home page
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u32,
    /// Words that may not appear in a comment (matched case-insensitively)
    #[serde(default = "default_bad_words")]
    pub bad_words: Vec<String>,
    /// Field error shown when a comment contains a forbidden word
    #[serde(default = "default_warning")]
    pub warning: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            bad_words: default_bad_words(),
            warning: default_warning(),
        }
    }
}

fn default_items_per_page() -> u32 {
    10
}

fn default_bad_words() -> Vec<String> {
    vec!["редиска".to_string(), "негодяй".to_string()]
}

fn default_warning() -> String {
    "Не ругайтесь!".to_string()
}

/// Login session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Days until a login session expires
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_days: default_expiration_days(),
        }
    }
}

/// Longest accepted session lifetime, in days
pub const MAX_SESSION_EXPIRATION_DAYS: i64 = 3650;

fn default_expiration_days() -> i64 {
    7
}

/// Template override settings
///
/// Built-in templates are always available; when `path` is set, any
/// `*.html` file found there replaces the built-in template of the same name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory with template overrides
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // serde_yaml rejects an empty document, so treat it as "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - NEWSROOM_SERVER_HOST
    /// - NEWSROOM_SERVER_PORT
    /// - NEWSROOM_DATABASE_DRIVER
    /// - NEWSROOM_DATABASE_URL
    /// - NEWSROOM_NEWS_ITEMS_PER_PAGE
    /// - NEWSROOM_NEWS_WARNING
    /// - NEWSROOM_SESSION_EXPIRATION_DAYS
    /// - NEWSROOM_THEME_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.news.items_per_page == 0 {
            return Err(ConfigError::ValidationError(
                "news.items_per_page must be greater than zero".to_string(),
            ));
        }
        if self.session.expiration_days <= 0 {
            return Err(ConfigError::ValidationError(
                "session.expiration_days must be positive".to_string(),
            ));
        }
        if self.session.expiration_days > MAX_SESSION_EXPIRATION_DAYS {
            return Err(ConfigError::ValidationError(format!(
                "session.expiration_days must be at most {}",
                MAX_SESSION_EXPIRATION_DAYS
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NEWSROOM_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NEWSROOM_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("NEWSROOM_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("NEWSROOM_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(count) = std::env::var("NEWSROOM_NEWS_ITEMS_PER_PAGE") {
            if let Ok(count) = count.parse::<u32>() {
                self.news.items_per_page = count;
            }
        }
        if let Ok(warning) = std::env::var("NEWSROOM_NEWS_WARNING") {
            self.news.warning = warning;
        }

        if let Ok(days) = std::env::var("NEWSROOM_SESSION_EXPIRATION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.session.expiration_days = days;
            }
        }

        if let Ok(path) = std::env::var("NEWSROOM_THEME_PATH") {
            self.theme.path = Some(PathBuf::from(path));
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "NEWSROOM_SERVER_HOST",
    "NEWSROOM_SERVER_PORT",
    "NEWSROOM_DATABASE_DRIVER",
    "NEWSROOM_DATABASE_URL",
    "NEWSROOM_NEWS_ITEMS_PER_PAGE",
    "NEWSROOM_NEWS_WARNING",
    "NEWSROOM_SESSION_EXPIRATION_DAYS",
    "NEWSROOM_THEME_PATH",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


/// Property-based tests for configuration parsing
#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn bad_word_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[а-я]{3,12}", 0..5)
    }

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            "[a-z]{2,10}\\.local",
            1u16..=65535,
            1u32..=500,
            bad_word_strategy(),
            "[A-Z][a-z]{2,10}!",
            1i64..=365,
        )
            .prop_map(|(host, port, items_per_page, bad_words, warning, days)| Config {
                server: ServerConfig { host, port },
                database: DatabaseConfig::default(),
                news: NewsConfig {
                    items_per_page,
                    bad_words,
                    warning,
                },
                session: SessionConfig {
                    expiration_days: days,
                },
                theme: ThemeConfig::default(),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Any valid configuration written as YAML loads back unchanged.
        #[test]
        fn config_yaml_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("serialize");
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let loaded = Config::load(file.path()).expect("Failed to load config");

            prop_assert_eq!(loaded.server.host, config.server.host);
            prop_assert_eq!(loaded.server.port, config.server.port);
            prop_assert_eq!(loaded.news.items_per_page, config.news.items_per_page);
            prop_assert_eq!(loaded.news.bad_words, config.news.bad_words);
            prop_assert_eq!(loaded.news.warning, config.news.warning);
            prop_assert_eq!(loaded.session.expiration_days, config.session.expiration_days);
        }

        /// Environment overrides win over file values.
        #[test]
        fn env_items_per_page_overrides_file(file_value in 1u32..100, env_value in 1u32..100) {
            let _guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            clear_env();

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "news:\n  items_per_page: {}\n", file_value).expect("Failed to write config");
            std::env::set_var("NEWSROOM_NEWS_ITEMS_PER_PAGE", env_value.to_string());

            let config = Config::load_with_env(file.path());
            clear_env();

            prop_assert_eq!(config.expect("Failed to load config").news.items_per_page, env_value);
        }
    }
}
