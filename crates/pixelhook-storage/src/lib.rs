//! Pixelhook Storage Library
//!
//! This crate provides the object store abstraction both pipelines read uploads
//! from and write thumbnails to, with implementations for S3 (and S3-compatible
//! providers) and the local filesystem.
//!
//! # Addressing
//!
//! Unlike a single-bucket media library, the bucket arrives with every upload
//! notification, so every operation takes a `(bucket, key)` pair. The local
//! backend maps that pair to `{root}/{bucket}/{key}`.
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use pixelhook_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
