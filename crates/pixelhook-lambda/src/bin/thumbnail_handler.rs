//! Thumbnail function: writes a bounded JPEG preview for every uploaded image.

use pixelhook_core::PipelineKind;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    pixelhook_lambda::run(PipelineKind::Thumbnail).await
}
