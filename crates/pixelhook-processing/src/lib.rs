//! Pixelhook Processing Library
//!
//! CPU-bound image work shared by both pipelines: decoding uploads into a
//! canonical RGB8 buffer, re-encoding for caption models that reject the
//! original format, and generating bounded JPEG thumbnails.
//!
//! Everything here is synchronous; the `*_blocking` helpers move the work onto
//! tokio's blocking pool.

pub mod image;

pub use self::image::{
    bounded_dimensions, DecodeError, DecodedImage, EncodeError, ImageDecoder, Thumbnail,
    ThumbnailGenerator,
};
