//! Domain layer with core value types, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Lazily mapped query results.
pub mod lazy_list;
/// Asynchronous value lifecycle.
pub mod loadable;
/// Port definitions.
pub mod ports;
pub mod serde_utils;

pub use entities::{Country, Image, ImageCacheKey, ImageLoadable};
pub use errors::{ImageError, ImageErrorKind, StoreError};
pub use lazy_list::LazyList;
pub use loadable::Loadable;
pub use ports::{
    FetchRequest, HttpTransport, ImageCacheRepository, ImageWebRepository, PersistentStore,
};
