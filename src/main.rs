//! CLI entry point for the bundlefetch tool.

use anyhow::Result;
use bundlefetch_core::{DispatchConfig, DispatchContext, Dispatcher, GATHER_ENGINE_ENV};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = DispatchConfig::from_env();
    if config.use_alternate_engine {
        debug!(env = GATHER_ENGINE_ENV, "alternate engine switch set");
    }

    let dispatcher = Dispatcher::new(config);
    let ctx = DispatchContext::new();

    // JSON mode keeps stdout clean for the metadata payload
    let show_progress = !args.quiet && !args.json;
    let metadata = dispatcher
        .download(&ctx, &args.dest, &args.source, show_progress)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string(&metadata)?);
    } else if let Some(metadata) = &metadata {
        info!(
            transport = metadata.transport.as_str(),
            revision = metadata.revision.as_deref().unwrap_or("-"),
            bytes = metadata.bytes.unwrap_or(0),
            "download complete"
        );
    } else {
        info!("download complete");
    }

    Ok(())
}
