//! Function runtime loop

use lambda_runtime::{service_fn, Error as LambdaError, LambdaEvent};
use pixelhook_core::{HandlerResponse, PipelineConfig, PipelineKind};
use pixelhook_pipeline::UploadHandler;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

use crate::setup::initialize_pipeline;

/// Load configuration from the environment and serve `kind` invocations.
pub async fn run(kind: PipelineKind) -> Result<(), LambdaError> {
    let config = PipelineConfig::from_env()?;
    let handler = initialize_pipeline(kind, &config).await?;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = handler.clone();
        async move { invoke(handler, event).await }
    }))
    .await
}

/// Answer one invocation. Pipeline failures are carried in the response, so
/// the runtime only ever sees success.
pub async fn invoke(
    handler: Arc<dyn UploadHandler>,
    event: LambdaEvent<Value>,
) -> Result<HandlerResponse, LambdaError> {
    let (payload, context) = event.into_parts();
    let span = tracing::info_span!(
        "invocation",
        pipeline = %handler.kind(),
        request_id = %context.request_id,
    );

    let response = handler.handle(&payload).instrument(span).await;
    Ok(response)
}
