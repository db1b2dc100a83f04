//! Thumbnail generation
//!
//! Thumbnails are bounded to a square box, keep the source aspect ratio and are
//! never upscaled. Output is always JPEG under the reserved thumbnail prefix.

use crate::image::decoder::DecodedImage;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use pixelhook_core::{ReservedPrefix, ThumbnailConfig};

const THUMBNAIL_EXTENSION: &str = "jpg";
const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Object key {0:?} has no file name")]
    NoFileName(String),

    #[error("Failed to encode JPEG: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encode task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    /// Destination key, always under the reserved prefix
    pub key: String,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    prefix: ReservedPrefix,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ThumbnailGenerator {
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            max_dimension: config.max_dimension.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// Namespace thumbnails are written to; also the loop guard's namespace.
    pub fn prefix(&self) -> &ReservedPrefix {
        &self.prefix
    }

    /// `<prefix><basename>.jpg` for the object at `source_key`.
    pub fn thumbnail_key(&self, source_key: &str) -> Option<String> {
        self.prefix.derive_key(source_key, THUMBNAIL_EXTENSION)
    }

    pub fn generate(&self, image: &DecodedImage, key_source: &str) -> Result<Thumbnail, EncodeError> {
        let key = self
            .thumbnail_key(key_source)
            .ok_or_else(|| EncodeError::NoFileName(key_source.to_string()))?;

        let (width, height) = bounded_dimensions(image.width(), image.height(), self.max_dimension);
        let resized;
        let pixels = if (width, height) == (image.width(), image.height()) {
            image.pixels()
        } else {
            resized = imageops::resize(image.pixels(), width, height, FilterType::Lanczos3);
            &resized
        };

        let data = encode_jpeg(pixels, self.jpeg_quality)?;

        tracing::debug!(
            source_width = image.width(),
            source_height = image.height(),
            width = width,
            height = height,
            size_bytes = data.len(),
            key = %key,
            "Thumbnail generated"
        );

        Ok(Thumbnail {
            data,
            width,
            height,
            key,
            content_type: THUMBNAIL_CONTENT_TYPE,
        })
    }

    /// [`ThumbnailGenerator::generate`] on the blocking thread pool.
    pub async fn generate_blocking(
        &self,
        image: DecodedImage,
        key_source: String,
    ) -> Result<Thumbnail, EncodeError> {
        let generator = self.clone();
        tokio::task::spawn_blocking(move || generator.generate(&image, &key_source))
            .await
            .map_err(|e| EncodeError::Task(e.to_string()))?
    }
}

/// Dimensions that fit `width x height` into a `max x max` box.
///
/// Images already inside the box are returned unchanged. Otherwise the larger
/// side becomes exactly `max` and the other side is rounded, never below 1.
pub fn bounded_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = |side: u32, longest: u32| -> u32 {
        let scaled = (side as f64 * max as f64 / longest as f64).round() as u32;
        scaled.clamp(1, max)
    };

    if width >= height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

pub(crate) fn encode_jpeg(pixels: &RgbImage, quality: u8) -> Result<Bytes, EncodeError> {
    let (width, height) = pixels.dimensions();
    let mut buffer = Vec::with_capacity((width * height) as usize);
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder.encode_image(pixels)?;
    Ok(Bytes::from(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::decoder::ImageDecoder;
    use image::{DynamicImage, ImageFormat, Rgb, Rgba, RgbaImage};
    use pixelhook_core::ImageBytes;
    use std::io::Cursor;

    fn decoded(width: u32, height: u32) -> DecodedImage {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        ImageDecoder::decode(&ImageBytes::new(buffer)).unwrap()
    }

    fn generator() -> ThumbnailGenerator {
        ThumbnailGenerator::new(&ThumbnailConfig::default())
    }

    #[test]
    fn test_bounded_dimensions() {
        assert_eq!(bounded_dimensions(300, 600, 128), (64, 128));
        assert_eq!(bounded_dimensions(600, 300, 128), (128, 64));
        assert_eq!(bounded_dimensions(128, 128, 128), (128, 128));
        assert_eq!(bounded_dimensions(100, 50, 128), (100, 50));
        assert_eq!(bounded_dimensions(129, 1, 128), (128, 1));
        assert_eq!(bounded_dimensions(10_000, 3, 128), (128, 1));
        assert_eq!(bounded_dimensions(1000, 333, 128), (128, 43));
    }

    #[test]
    fn test_generate_portrait() {
        let thumb = generator().generate(&decoded(300, 600), "photos/dog.jpg").unwrap();
        assert_eq!((thumb.width, thumb.height), (64, 128));
        assert_eq!(thumb.key, "thumbnail/dog.jpg");
        assert_eq!(thumb.content_type, "image/jpeg");

        let again = ImageDecoder::decode(&ImageBytes::new(thumb.data)).unwrap();
        assert_eq!(again.format(), ImageFormat::Jpeg);
        assert_eq!((again.width(), again.height()), (64, 128));
    }

    #[test]
    fn test_generate_does_not_upscale() {
        let thumb = generator().generate(&decoded(40, 90), "small.png").unwrap();
        assert_eq!((thumb.width, thumb.height), (40, 90));
        assert_eq!(thumb.key, "thumbnail/small.jpg");
    }

    #[test]
    fn test_generate_from_transparent_png() {
        let img = RgbaImage::from_pixel(256, 256, Rgba([255, 0, 0, 0]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        let decoded = ImageDecoder::decode(&ImageBytes::new(buffer)).unwrap();

        let thumb = generator().generate(&decoded, "logo.png").unwrap();
        assert_eq!((thumb.width, thumb.height), (128, 128));
    }

    #[test]
    fn test_generate_requires_file_name() {
        assert!(matches!(
            generator().generate(&decoded(10, 10), "photos/"),
            Err(EncodeError::NoFileName(_))
        ));
    }

    #[test]
    fn test_custom_bounds() {
        let config = ThumbnailConfig {
            prefix: ReservedPrefix::new("thumbs/small/").unwrap(),
            max_dimension: 32,
            jpeg_quality: 50,
        };
        let thumb = ThumbnailGenerator::new(&config)
            .generate(&decoded(200, 100), "a/b/cat.webp")
            .unwrap();
        assert_eq!((thumb.width, thumb.height), (32, 16));
        assert_eq!(thumb.key, "thumbs/small/cat.jpg");
    }

    #[tokio::test]
    async fn test_generate_blocking() {
        let thumb = generator()
            .generate_blocking(decoded(512, 256), "wide.png".to_string())
            .await
            .unwrap();
        assert_eq!((thumb.width, thumb.height), (128, 64));
    }
}
