//! Image processing module
//!
//! - Decoding and color normalization (decoder)
//! - Thumbnail sizing and JPEG encoding (thumbnail)

pub mod decoder;
pub mod thumbnail;

pub use decoder::{DecodeError, DecodedImage, ImageDecoder};
pub use thumbnail::{bounded_dimensions, EncodeError, Thumbnail, ThumbnailGenerator};
