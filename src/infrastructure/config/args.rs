//! Command-line arguments.

use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments, merged over the configuration file.
#[derive(Debug, Parser)]
#[command(
    name = "countries",
    version,
    about = "Browse countries from a local store and load their flags",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Directory holding the local database.
    #[arg(long, value_name = "PATH", env = "COUNTRIES_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Import countries from a JSON file before listing.
    #[arg(long, value_name = "PATH")]
    pub import: Option<PathBuf>,

    /// Filter countries by name.
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Locale used for localized names.
    #[arg(long, default_value = "en")]
    pub locale: String,

    /// Load the flag of this country (alpha-3 code).
    #[arg(long, value_name = "CODE")]
    pub flag: Option<String>,

    /// Load an image by URL.
    #[arg(long, value_name = "URL")]
    pub image: Option<String>,

    /// Target image width in pixels.
    #[arg(long)]
    pub width: Option<u32>,
}
