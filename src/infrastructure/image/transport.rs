//! reqwest-backed HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};

use crate::domain::errors::ImageError;
use crate::domain::ports::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

const USER_AGENT: &str = concat!("countries/", env!("CARGO_PKG_VERSION"));

/// HTTP transport over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given request timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ImageError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ImageError> {
        debug!(method = ?request.method, url = %request.url, "Sending request");

        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url),
            HttpMethod::Post => self.client.post(request.url).form(&request.form),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ImageError::transport(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ImageError::transport(format!("failed to read body: {e}")))?;

        trace!(status, bytes = body.len(), "Received response");

        Ok(HttpResponse { status, body })
    }
}
