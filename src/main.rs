//! CLI entry point for the relay.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use core_runtime::config::AppConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::{bootstrap_desktop, CoreError};
use tracing::{debug, error, info};

mod cli;

use cli::Args;

/// Configuration or logging could not be set up
const EXIT_CONFIG: u8 = 1;

/// The refresh token exchange failed
const EXIT_AUTH: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let mut logging = LoggingConfig::default()
        .with_format(args.log_format.into())
        .with_level(args.log_level());
    if let Ok(filter) = std::env::var("RUST_LOG") {
        logging = logging.with_filter(filter);
    }
    if let Err(err) = init_logging(logging) {
        eprintln!("drive-relay: {}", err);
        return ExitCode::from(EXIT_CONFIG);
    }

    debug!(?args, "CLI arguments parsed");

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            match err.downcast_ref::<CoreError>() {
                Some(CoreError::Auth(_)) => ExitCode::from(EXIT_AUTH),
                _ => ExitCode::from(EXIT_CONFIG),
            }
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = AppConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    info!(
        targets = config.targets().len(),
        aria2 = %config.aria2.api,
        "Configuration loaded"
    );

    let relay = bootstrap_desktop(config)?;

    if args.dry_run {
        let collection = relay.plan().await?;
        for item in &collection {
            println!("{}\t{}\t{}", item.path, item.name, item.size);
        }
        info!(
            collected = collection.len(),
            bytes = collection.total_size(),
            "Dry run; nothing was queued"
        );
        return Ok(());
    }

    let report = relay.run().await?;
    info!(
        collected = report.collected,
        bytes = report.total_bytes,
        queued = report.dispatch.queued(),
        rejected = report.dispatch.rejected(),
        failed = report.dispatch.failed(),
        "Summary"
    );
    Ok(())
}
