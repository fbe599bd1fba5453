//! Port definitions for external collaborators.

mod http_port;
mod image_cache_port;
mod image_web_port;
mod store_port;

pub use http_port::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use image_cache_port::ImageCacheRepository;
pub use image_web_port::ImageWebRepository;
pub use store_port::{FetchRequest, PersistentStore, RowMapper};

#[cfg(test)]
pub mod mocks {
    pub use super::http_port::mock::MockHttpTransport;
    pub use super::image_web_port::mock::MockImageWebRepository;
}
