//! Configuration layer: typed settings with file → environment precedence.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const LOCAL_CONFIG_BASENAME: &str = "foglio";
const ENV_PREFIX: &str = "FOGLIO";
const ENV_SEPARATOR: &str = "__";

const DEFAULT_DATABASE_DIR: &str = "data/blog";
const DEFAULT_POSTS_PER_PAGE: i64 = 4;
const DEFAULT_COMMENTS_CLOSE_AFTER_DAYS: i64 = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] ConfigError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub blog: BlogSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Directory holding the embedded document store.
    pub directory: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DATABASE_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogSettings {
    /// Page size the presentation layer asks for by default.
    pub posts_per_page: usize,
    /// Days after publication during which a post accepts comments.
    pub comments_close_after_days: i64,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_POSTS_PER_PAGE as usize,
            comments_close_after_days: DEFAULT_COMMENTS_CLOSE_AFTER_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

/// Load settings from the optional local `foglio.*` file and the
/// `FOGLIO__*` environment, over built-in defaults.
pub fn load() -> Result<Settings, SettingsError> {
    load_from(None)
}

/// Load settings, preferring an explicit configuration file when given.
pub fn load_from(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut builder = Config::builder()
        .set_default("database.directory", DEFAULT_DATABASE_DIR)?
        .set_default("blog.posts_per_page", DEFAULT_POSTS_PER_PAGE)?
        .set_default("blog.comments_close_after_days", DEFAULT_COMMENTS_CLOSE_AFTER_DAYS)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "compact")?;

    builder = match path {
        Some(path) => builder.add_source(File::from(path.to_path_buf())),
        None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
    };

    let config = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
        .build()?;

    Ok(config.try_deserialize()?)
}
