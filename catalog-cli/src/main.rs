//! Catalog operator CLI.
//!
//! Usage:
//!   catalog --db catalog.db create-service airflow
//!   catalog --db catalog.db create-user alice
//!   catalog --db catalog.db put-pipeline pipeline.json --service airflow --owner alice
//!   catalog --db catalog.db history airflow.daily

use anyhow::Result;
use catalog_cli::{run, Args};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut stdout = std::io::stdout().lock();
    run(&args, &mut stdout).await
}
