//! Binary crate for the `weather-report` job.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Installing the log subscriber
//! - Handing control to the core runner

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
