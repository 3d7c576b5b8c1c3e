use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacewarden_core::{
    bytes_to_gib, check_free_space, load_config, validate_config, Fs2DiskUsage,
    QBittorrentClient, ReconcileOutcome, SpaceReconciler, StrategyKind,
};

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Checks for sufficient disk space and attempts to free it up by removing
/// finished torrents if necessary.
#[derive(Debug, Parser)]
#[command(name = "spacewarden", version)]
struct Cli {
    /// Filesystem path to check for free space (e.g. /downloads)
    path: PathBuf,

    /// Required amount of free space, in bytes
    bytes: u64,

    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Removal priority, overriding cleanup.strategy from the configuration
    /// (smallest-first or seeding-efficiency)
    #[arg(long)]
    strategy: Option<StrategyKind>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(outcome) => {
            report(&outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ReconcileOutcome> {
    let free_bytes = check_free_space(&Fs2DiskUsage, &cli.path, cli.bytes)
        .with_context(|| format!("Failed to check free space at {:?}", cli.path))?;
    if free_bytes >= cli.bytes {
        info!("Sufficient disk space is already available");
        return Ok(ReconcileOutcome::AlreadySufficient { free_bytes });
    }

    // Configuration is only needed once torrents may have to go.
    info!("Loading configuration from {:?}", cli.config);
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    if let Some(strategy) = cli.strategy {
        config.cleanup.strategy = strategy;
    }
    info!("Removal strategy: {}", config.cleanup.strategy);

    let torrent_client = QBittorrentClient::new(config.qbittorrent.clone())
        .context("Failed to create qBittorrent client")?;

    let reconciler = SpaceReconciler::new(
        config.cleanup,
        Arc::new(torrent_client),
        Arc::new(Fs2DiskUsage),
    );

    let outcome = reconciler
        .free_space(&cli.path, cli.bytes, free_bytes)
        .await
        .with_context(|| {
            format!(
                "Could not free {:.2} GiB at {:?}",
                bytes_to_gib(cli.bytes),
                cli.path
            )
        })?;
    Ok(outcome)
}

fn report(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::AlreadySufficient { free_bytes } => {
            info!(
                "SUCCESS: {:.2} GiB free, no torrents removed",
                bytes_to_gib(*free_bytes)
            );
        }
        ReconcileOutcome::Freed {
            removed,
            freed_estimate_bytes,
            free_bytes,
        } => {
            info!(
                "SUCCESS: removed {} torrent(s) ({:.2} GiB), {:.2} GiB now free",
                removed.len(),
                bytes_to_gib(*freed_estimate_bytes),
                bytes_to_gib(*free_bytes)
            );
        }
    }
}
