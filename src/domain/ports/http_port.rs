//! Port definition for HTTP round trips.

use bytes::Bytes;
use reqwest::Url;

use crate::domain::errors::ImageError;

/// HTTP method of a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request with a form body.
    Post,
}

/// A single outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Target URL.
    pub url: Url,
    /// Form fields, sent url-encoded for POST requests.
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// Creates a GET request.
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            form: Vec::new(),
        }
    }

    /// Creates a POST request with a form body.
    #[must_use]
    pub const fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            form,
        }
    }
}

/// Response status and body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Port performing one HTTP round trip per call.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and reads the full body.
    ///
    /// # Errors
    /// Returns [`ImageError::Transport`] if the request cannot be completed.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ImageError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Mock transport answering from a table of canned responses.
    #[derive(Default)]
    pub struct MockHttpTransport {
        responses: Mutex<HashMap<String, Result<HttpResponse, ImageError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockHttpTransport {
        /// Creates a transport with no canned responses.
        pub fn new() -> Self {
            Self::default()
        }

        /// Answers requests to `url` with a 200 and `body`.
        pub fn with_body(self, url: &str, body: impl Into<Bytes>) -> Self {
            self.responses.lock().insert(
                url.to_string(),
                Ok(HttpResponse {
                    status: 200,
                    body: body.into(),
                }),
            );
            self
        }

        /// Answers requests to `url` with `status` and an empty body.
        pub fn with_status(self, url: &str, status: u16) -> Self {
            self.responses.lock().insert(
                url.to_string(),
                Ok(HttpResponse {
                    status,
                    body: Bytes::new(),
                }),
            );
            self
        }

        /// Answers requests to `url` with a transport error.
        pub fn with_error(self, url: &str, error: ImageError) -> Self {
            self.responses.lock().insert(url.to_string(), Err(error));
            self
        }

        /// Returns every request sent so far, in order.
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }

        /// Returns the URLs requested so far, in order.
        pub fn requested_urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .iter()
                .map(|request| request.url.to_string())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for MockHttpTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ImageError> {
            let url = request.url.to_string();
            self.requests.lock().push(request);
            self.responses
                .lock()
                .get(&url)
                .cloned()
                .unwrap_or_else(|| Err(ImageError::transport(format!("no mock for {url}"))))
        }
    }
}
