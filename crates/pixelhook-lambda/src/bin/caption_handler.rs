//! Caption function: describes every uploaded image and stores the caption.

use pixelhook_core::PipelineKind;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    pixelhook_lambda::run(PipelineKind::Caption).await
}
