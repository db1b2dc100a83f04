//! Image decoder - turns uploaded bytes into a canonical RGB8 buffer

use crate::image::thumbnail::{encode_jpeg, EncodeError};
use image::{ColorType, ImageFormat, ImageReader, RgbImage};
use pixelhook_core::ImageBytes;
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Decode task failed: {0}")]
    Task(String),
}

/// Decoded pixels, always three-channel 8-bit RGB.
#[derive(Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
    format: ImageFormat,
    source_color: ColorType,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Container format the bytes were decoded from
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Color type before normalization to RGB8
    pub fn source_color(&self) -> ColorType {
        self.source_color
    }

    /// Whether normalization dropped an alpha channel
    pub fn had_alpha(&self) -> bool {
        self.source_color.has_alpha()
    }

    /// Re-encode as JPEG, for consumers that reject the source format.
    pub fn to_jpeg(&self, quality: u8) -> Result<ImageBytes, EncodeError> {
        let data = encode_jpeg(&self.pixels, quality)?;
        Ok(ImageBytes::with_content_type(data, "image/jpeg"))
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format)
            .field("source_color", &self.source_color)
            .finish()
    }
}

pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode with the format guessed from content.
    ///
    /// Palette images are expanded by the codec; alpha is dropped. Every mode
    /// ends up as RGB8 so downstream encoders see one pixel layout.
    pub fn decode(image: &ImageBytes) -> Result<DecodedImage, DecodeError> {
        let reader = ImageReader::new(Cursor::new(image.data().as_ref())).with_guessed_format()?;
        let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
        let img = reader.decode()?;
        let source_color = img.color();

        if source_color != ColorType::Rgb8 {
            tracing::debug!(
                source_color = ?source_color,
                format = ?format,
                "Normalizing image to RGB8"
            );
        }

        Ok(DecodedImage {
            pixels: img.into_rgb8(),
            format,
            source_color,
        })
    }

    /// [`ImageDecoder::decode`] on the blocking thread pool.
    pub async fn decode_blocking(image: ImageBytes) -> Result<DecodedImage, DecodeError> {
        tokio::task::spawn_blocking(move || Self::decode(&image))
            .await
            .map_err(|e| DecodeError::Task(e.to_string()))?
    }
}
