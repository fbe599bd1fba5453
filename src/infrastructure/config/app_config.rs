//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::use_cases::DEFAULT_TARGET_WIDTH;
use crate::infrastructure::image::{DEFAULT_CACHE_SIZE, DEFAULT_CONVERSION_BASE_URL};
use crate::infrastructure::persistence::StoreVersion;

pub(crate) const APP_NAME: &str = "countries";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "countries-browser";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image loading configuration.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Local store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Image loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Number of decoded images kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Width images are downscaled to. `None` keeps the original size.
    #[serde(default = "default_target_width")]
    pub target_width: Option<u32>,

    /// Base URL of the SVG conversion service.
    #[serde(default = "default_conversion_base_url")]
    pub conversion_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            target_width: default_target_width(),
            conversion_base_url: default_conversion_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the database file. Defaults to the data directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Store layout version.
    #[serde(default)]
    pub version: StoreVersion,
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_SIZE
}

#[allow(clippy::unnecessary_wraps)]
const fn default_target_width() -> Option<u32> {
    Some(DEFAULT_TARGET_WIDTH)
}

fn default_conversion_base_url() -> String {
    DEFAULT_CONVERSION_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(width) = args.width {
            self.images.target_width = Some(width);
        }
        if let Some(directory) = &args.data_dir {
            self.store.directory = Some(directory.clone());
        }
    }

    /// Returns default data directory.
    #[must_use]
    pub fn default_data_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        Self::default_data_dir().map(|dir| dir.join("countries.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns the database file path for the configured store version.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        self.store
            .directory
            .clone()
            .or_else(Self::default_data_dir)
            .map(|dir| self.store.version.db_path(&dir))
    }
}
