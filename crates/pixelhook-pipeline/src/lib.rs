//! Pixelhook Pipelines
//!
//! The two event handlers triggered by image uploads:
//!
//! - [`CaptionPipeline`]: describe the image with a vision model and store the
//!   caption on the matching database row.
//! - [`ThumbnailPipeline`]: write a bounded JPEG preview under the reserved
//!   thumbnail prefix.
//!
//! Both take a raw notification envelope and always answer with a
//! [`HandlerResponse`](pixelhook_core::HandlerResponse); failures are reported
//! through the status code, never as a runtime error.

pub mod caption;
pub mod error;
pub mod handler;
pub mod thumbnail;

pub use caption::{CaptionPipeline, CaptionSettings};
pub use error::PipelineError;
pub use handler::UploadHandler;
pub use thumbnail::ThumbnailPipeline;
