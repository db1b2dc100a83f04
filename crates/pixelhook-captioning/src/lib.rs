//! Pixelhook Captioning Library
//!
//! Hosted vision models that turn an image into a short caption. Backends are
//! selected by configuration and feature flags:
//!
//! - `caption-gemini`: Google Generative Language `generateContent`
//! - `caption-claude`: Anthropic Messages API
//!
//! A failed call is always an error; no error text is ever returned as a caption.

#[cfg(feature = "caption-claude")]
pub mod claude;
pub mod factory;
#[cfg(feature = "caption-gemini")]
pub mod gemini;
mod http;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "caption-claude")]
pub use claude::ClaudeCaptioner;
pub use factory::create_caption_model;
#[cfg(feature = "caption-gemini")]
pub use gemini::GeminiCaptioner;
pub use traits::{CaptionError, CaptionModel};
