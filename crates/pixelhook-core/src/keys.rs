//! Key derivation and the reserved output namespace
//!
//! The thumbnail pipeline writes into the bucket it subscribes to. Its outputs
//! live under a reserved prefix, and the same [`ReservedPrefix`] value both
//! builds output keys and recognizes them in incoming notifications, so the
//! writer and the loop guard cannot drift apart.

use std::fmt::{Display, Formatter, Result as FmtResult};

pub const DEFAULT_THUMBNAIL_PREFIX: &str = "thumbnail/";

/// Key namespace owned by a pipeline's own outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedPrefix(String);

impl ReservedPrefix {
    /// Prefixes must be non-empty and end at a path segment boundary.
    pub fn new(prefix: impl Into<String>) -> Result<Self, anyhow::Error> {
        let prefix = prefix.into();
        if prefix.is_empty() || !prefix.ends_with('/') || prefix.starts_with('/') {
            return Err(anyhow::anyhow!(
                "Reserved prefix must be non-empty, relative and end with '/': {:?}",
                prefix
            ));
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a key was produced by the owning pipeline.
    pub fn is_reserved(&self, key: &str) -> bool {
        key.starts_with(&self.0)
    }

    /// Output key for the object at `source_key`: `<prefix><identifier>.<extension>`.
    ///
    /// Returns `None` when the source key has no file name (e.g. `photos/`).
    pub fn derive_key(&self, source_key: &str, extension: &str) -> Option<String> {
        derive_identifier(source_key).map(|id| format!("{}{}.{}", self.0, id, extension))
    }
}

impl Default for ReservedPrefix {
    fn default() -> Self {
        Self(DEFAULT_THUMBNAIL_PREFIX.to_string())
    }
}

impl Display for ReservedPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Identifier joining a stored object to its database row: the file name with
/// directories (including any reserved prefix) and the final extension removed.
///
/// Leading dots are part of the name, so `.profile` keeps its name and
/// `archive.tar.gz` becomes `archive.tar`.
pub fn derive_identifier(key: &str) -> Option<String> {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    let stem = match file_name[leading_dots..].rfind('.') {
        Some(idx) => &file_name[..leading_dots + idx],
        None => file_name,
    };

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_identifier_strips_directories_and_extension() {
        assert_eq!(derive_identifier("photos/dog.jpg").as_deref(), Some("dog"));
        assert_eq!(derive_identifier("dog.jpeg").as_deref(), Some("dog"));
        assert_eq!(derive_identifier("a/b/c/dog").as_deref(), Some("dog"));
        assert_eq!(
            derive_identifier("backups/archive.tar.gz").as_deref(),
            Some("archive.tar")
        );
    }

    #[test]
    fn test_derive_identifier_strips_thumbnail_prefix() {
        assert_eq!(derive_identifier("thumbnail/dog.jpg").as_deref(), Some("dog"));
    }

    #[test]
    fn test_derive_identifier_keeps_leading_dots() {
        assert_eq!(derive_identifier(".profile").as_deref(), Some(".profile"));
        assert_eq!(derive_identifier("x/.cover.png").as_deref(), Some(".cover"));
    }

    #[test]
    fn test_derive_identifier_rejects_directory_markers() {
        assert_eq!(derive_identifier("photos/"), None);
        assert_eq!(derive_identifier(""), None);
    }

    #[test]
    fn test_reserved_prefix_is_reserved() {
        let prefix = ReservedPrefix::default();
        assert!(prefix.is_reserved("thumbnail/dog.jpg"));
        assert!(!prefix.is_reserved("photos/thumbnail/dog.jpg"));
        assert!(!prefix.is_reserved("thumbnails/dog.jpg"));
    }

    #[test]
    fn test_reserved_prefix_derive_key() {
        let prefix = ReservedPrefix::default();
        assert_eq!(
            prefix.derive_key("photos/dog.png", "jpg").as_deref(),
            Some("thumbnail/dog.jpg")
        );
        assert_eq!(prefix.derive_key("photos/", "jpg"), None);
    }

    #[test]
    fn test_derived_keys_are_always_reserved() {
        let prefix = ReservedPrefix::new("derived/thumbs/").unwrap();
        for key in ["a.jpg", "x/y/z.webp", "deep/nested/.hidden", "noext"] {
            let derived = prefix.derive_key(key, "jpg").unwrap();
            assert!(prefix.is_reserved(&derived), "{} not reserved", derived);
        }
    }

    #[test]
    fn test_reserved_prefix_validation() {
        assert!(ReservedPrefix::new("").is_err());
        assert!(ReservedPrefix::new("thumbnail").is_err());
        assert!(ReservedPrefix::new("/thumbnail/").is_err());
        assert!(ReservedPrefix::new("thumbnail/").is_ok());
    }
}
