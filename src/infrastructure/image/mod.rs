//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching with LRU eviction
//! - Direct and converted image downloads
//! - A reqwest transport for the download pipeline

pub mod markup;
pub mod memory_cache;
pub mod transport;
pub mod web_repository;

pub use memory_cache::{CacheStats, DEFAULT_CACHE_SIZE, MemoryImageCache};
pub use transport::ReqwestTransport;
pub use web_repository::{DEFAULT_CONVERSION_BASE_URL, RealImageWebRepository};
