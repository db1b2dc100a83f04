use anyhow::{Context, Result};
use clap::Parser;
use pixelhook_core::{build_notification, PipelineConfig, PipelineKind};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "replay_event")]
#[command(about = "Run one upload notification through a pipeline and print its response")]
struct Args {
    /// Pipeline to run: caption or thumbnail
    #[arg(long, value_name = "PIPELINE")]
    pipeline: PipelineKind,

    /// File holding a captured notification envelope
    #[arg(long, value_name = "FILE", conflicts_with_all = ["bucket", "key"])]
    event: Option<PathBuf>,

    /// Bucket of the object to replay (used with --key)
    #[arg(long, requires = "key")]
    bucket: Option<String>,

    /// Object key to replay (used with --bucket)
    #[arg(long, requires = "bucket")]
    key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let event = load_event(&args)?;

    let config = PipelineConfig::from_env()?;
    let handler = pixelhook_lambda::initialize_pipeline(args.pipeline, &config).await?;

    let response = handler.handle(&event).await;
    tracing::debug!(status_code = response.status_code, "Replay finished");

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_event(args: &Args) -> Result<Value> {
    match (&args.event, &args.bucket, &args.key) {
        (Some(path), _, _) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read event file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Event file {} is not valid JSON", path.display()))
        }
        (None, Some(bucket), Some(key)) => Ok(build_notification(bucket, key)),
        _ => Err(anyhow::anyhow!(
            "Provide either --event <FILE> or both --bucket and --key"
        )),
    }
}
