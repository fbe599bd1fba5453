//! Port definition for fetching images over the network.

use reqwest::Url;

use crate::domain::entities::Image;
use crate::domain::errors::ImageError;

/// Port for downloading and decoding images.
#[async_trait::async_trait]
pub trait ImageWebRepository: Send + Sync {
    /// Downloads the image at `url`, converting it first if its format is not
    /// directly decodable, and downscales it to `width` if it is wider.
    ///
    /// # Errors
    /// Returns a transport error if a request fails, or
    /// [`ImageError::UnexpectedResponse`] if any response cannot be parsed or
    /// decoded.
    async fn load(&self, url: &Url, width: Option<u32>) -> Result<Image, ImageError>;
}
