//! Domain error types.

mod image_error;
mod store_error;

pub use image_error::{ImageError, ImageErrorKind, ResponseIssue};
pub use store_error::StoreError;
