//! Test fixtures: notification envelopes and generated images.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use pixelhook_core::event::{storage_event, topic_envelope};
use serde_json::Value;
use std::io::Cursor;

/// Topic delivery for an upload of `key`, which is used verbatim (already encoded).
pub fn envelope(bucket: &str, key: &str) -> Value {
    topic_envelope(&storage_event(bucket, key).to_string())
}

/// Topic delivery with an arbitrary message string.
pub fn envelope_with_message(message: &str) -> Value {
    topic_envelope(message)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([20, 140, 220, 100]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}
