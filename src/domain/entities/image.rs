//! Domain types for image handling.

use std::sync::Arc;

use reqwest::Url;

use crate::domain::errors::ImageError;
use crate::domain::loadable::Loadable;

/// A decoded image shared between the cache and its observers.
pub type Image = Arc<image::DynamicImage>;

/// State slot value the UI renders for one image.
pub type ImageLoadable = Loadable<Image, ImageError>;

/// Cache key of an image: the absolute string form of its source URL.
///
/// Two URLs that point at the same resource but differ textually get
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageCacheKey(String);

impl ImageCacheKey {
    /// Creates a key from a raw string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Url> for ImageCacheKey {
    fn from(url: &Url) -> Self {
        Self(url.as_str().to_owned())
    }
}

impl std::fmt::Display for ImageCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an image was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Found in the in-memory cache.
    MemoryCache,
    /// Downloaded (and possibly converted) from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Raster formats decoded directly, without the conversion service.
const DIRECT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Returns true if the URL path names a raster format the decoder handles.
#[must_use]
pub fn is_directly_decodable(url: &Url) -> bool {
    let Some(extension) = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
    else {
        return false;
    };
    DIRECT_EXTENSIONS.contains(&extension.as_str())
}
