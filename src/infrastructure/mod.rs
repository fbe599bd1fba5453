//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Image handling (memory cache, conversion service, HTTP transport).
pub mod image;
/// Local database.
pub mod persistence;

pub use self::image::{
    CacheStats, DEFAULT_CACHE_SIZE, DEFAULT_CONVERSION_BASE_URL, MemoryImageCache,
    RealImageWebRepository, ReqwestTransport,
};
pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use persistence::{SqliteStore, StoreVersion};
