//! Image download with an optional conversion round trip.
//!
//! Raster URLs are fetched and decoded directly. Anything else is sent through
//! the conversion service: request a conversion page, post its token, then
//! download the converted raster image.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;
use reqwest::Url;
use tracing::{debug, instrument, warn};

use crate::domain::entities::{Image, is_directly_decodable};
use crate::domain::errors::{ImageError, ResponseIssue};
use crate::domain::ports::{HttpRequest, HttpTransport, ImageWebRepository};

use super::markup::{parse_conversion_form, parse_converted_image_url};

/// Default base URL of the conversion service.
pub const DEFAULT_CONVERSION_BASE_URL: &str = "https://ezgif.com";

const CONVERSION_PATH: &str = "svg-to-png";

/// Web repository resolving images through an [`HttpTransport`].
pub struct RealImageWebRepository {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl std::fmt::Debug for RealImageWebRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealImageWebRepository")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RealImageWebRepository {
    /// Creates a repository using `base_url` for conversions.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the conversion service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn conversion_url(&self, source: &Url) -> Result<Url, ImageError> {
        let endpoint = format!("{}/{CONVERSION_PATH}", self.base_url);
        let mut url = Url::parse(&endpoint).map_err(|e| {
            ImageError::transport(format!("invalid conversion endpoint {endpoint}: {e}"))
        })?;
        url.query_pairs_mut().append_pair("url", source.as_str());
        Ok(url)
    }

    /// Performs one round trip and returns the body of a successful response.
    async fn fetch(&self, request: HttpRequest) -> Result<Bytes, ImageError> {
        let url = request.url.to_string();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ImageError::Http {
                status: response.status,
                url,
            });
        }
        Ok(response.body)
    }

    async fn convert(&self, source: &Url) -> Result<Bytes, ImageError> {
        let page = self.fetch(HttpRequest::get(self.conversion_url(source)?)).await?;
        let form = parse_conversion_form(&String::from_utf8_lossy(&page))?;
        debug!(action = %form.action, "Conversion form received");

        let mut submit_url = form.action;
        submit_url.query_pairs_mut().append_pair("ajax", "true");
        let result_page = self
            .fetch(HttpRequest::post_form(
                submit_url.clone(),
                vec![("token".to_string(), form.token)],
            ))
            .await?;
        let download_url =
            parse_converted_image_url(&String::from_utf8_lossy(&result_page), &submit_url)?;
        debug!(url = %download_url, "Conversion finished");

        self.fetch(HttpRequest::get(download_url)).await
    }
}

#[async_trait]
impl ImageWebRepository for RealImageWebRepository {
    #[instrument(name = "image_web_load", skip(self, url), fields(url = %url))]
    async fn load(&self, url: &Url, width: Option<u32>) -> Result<Image, ImageError> {
        let bytes = if is_directly_decodable(url) {
            self.fetch(HttpRequest::get(url.clone())).await?
        } else {
            self.convert(url).await?
        };

        let decoded = tokio::task::spawn_blocking(move || decode(&bytes, width))
            .await
            .map_err(|e| ResponseIssue::Undecodable(format!("decode task panicked: {e}")))?
            .inspect_err(|e| warn!(error = %e, "Failed to decode image"))?;

        Ok(Arc::new(decoded))
    }
}

/// Decodes raster bytes and downscales to `width`, keeping the aspect ratio.
/// Images narrower than `width` are left as they are.
fn decode(bytes: &[u8], width: Option<u32>) -> Result<image::DynamicImage, ResponseIssue> {
    let image =
        image::load_from_memory(bytes).map_err(|e| ResponseIssue::Undecodable(e.to_string()))?;

    match width {
        Some(target) if target > 0 && image.width() > target => {
            let height = u64::from(image.height()) * u64::from(target) / u64::from(image.width());
            let height = u32::try_from(height).unwrap_or(u32::MAX).max(1);
            Ok(image.resize_exact(target, height, FilterType::Lanczos3))
        }
        _ => Ok(image),
    }
}
