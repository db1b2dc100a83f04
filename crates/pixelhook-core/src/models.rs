//! Domain models for a single pipeline invocation

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Reference to the object an upload notification announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadNotification {
    pub bucket: String,
    /// Decoded object key (storage events URL-encode keys; parsing undoes that)
    pub key: String,
}

impl Display for UploadNotification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Raw object payload plus the MIME type sniffed from its leading bytes.
#[derive(Clone)]
pub struct ImageBytes {
    data: Bytes,
    content_type: &'static str,
}

impl ImageBytes {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_type = detect_media_type(&data);
        Self { data, content_type }
    }

    /// Wrap bytes whose type is already known (e.g. freshly encoded JPEG).
    pub fn with_content_type(data: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Debug for ImageBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ImageBytes")
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

/// Detect media type from image data using magic numbers
pub fn detect_media_type(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png";
    }
    if data.starts_with(b"GIF8") {
        return "image/gif";
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return "image/webp";
    }
    if data.starts_with(b"BM") {
        return "image/bmp";
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return "image/tiff";
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        match &data[8..12] {
            b"heic" | b"heix" | b"heim" | b"heis" => return "image/heic",
            b"mif1" | b"msf1" => return "image/heif",
            _ => {}
        }
    }
    "application/octet-stream"
}

/// Generated description of an image. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption(String);

impl Caption {
    /// Trim model output; `None` when nothing but whitespace remains.
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Caption {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Database connection parameters as stored in the secret store.
///
/// RDS-managed secrets carry extra keys (`engine`, `dbInstanceIdentifier`) which
/// are ignored. `port` is accepted either as a number or as a numeric string.
#[derive(Clone, Deserialize)]
pub struct DbCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
    pub dbname: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
}

impl Debug for DbCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .finish()
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u64),
        Text(String),
    }

    let port = match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => n,
        PortValue::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {:?}", s)))?,
    };

    u16::try_from(port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| serde::de::Error::custom(format!("port out of range: {}", port)))
}

/// Synchronous acknowledgment returned to the invoking platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
