//! MindMentor API Server
//!
//! Runs the chat relay as a standalone HTTP server.

use anyhow::Result;
use clap::Parser;
use mindmentor::{run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mindmentor=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let config = ServerConfig::parse();

    info!("Starting MindMentor API");
    run_server(config).await?;
    info!("MindMentor API stopped");

    Ok(())
}
