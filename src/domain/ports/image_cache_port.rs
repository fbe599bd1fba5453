//! Port definition for the in-memory image cache.

use crate::domain::entities::{Image, ImageCacheKey};
use crate::domain::errors::ImageError;

/// Port for image caching operations.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCacheRepository: Send + Sync {
    /// Looks up a cached image.
    ///
    /// # Errors
    /// Returns [`ImageError::NotFound`] when the key is absent. Callers treat
    /// this as a signal to fall back, not as a failure.
    async fn cached_image(&self, key: &ImageCacheKey) -> Result<Image, ImageError>;

    /// Stores an image, replacing any entry under the same key.
    async fn cache(&self, image: Image, key: ImageCacheKey);

    /// Drops every cached image.
    async fn purge_cache(&self);
}
