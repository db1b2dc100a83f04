//! Storage setup and initialization

use anyhow::Result;
use pixelhook_core::PipelineConfig;
use pixelhook_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &PipelineConfig) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(&config.storage).await?;
    tracing::info!(
        backend = ?storage.backend_type(),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}
