//! Pixelhook Lambda
//!
//! Function entry points. Each binary loads configuration once per cold start,
//! wires one pipeline and then serves invocations until the runtime shuts it
//! down.

pub mod runtime;
pub mod setup;

pub use runtime::{invoke, run};
pub use pixelhook_pipeline::UploadHandler;
pub use setup::initialize_pipeline;
