//! Domain entity definitions.

mod country;
mod image;

pub use country::Country;
pub use self::image::{Image, ImageCacheKey, ImageLoadable, ImageSource, is_directly_decodable};
