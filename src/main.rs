use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod config;
mod matches;
mod models;
mod notify;
mod players;
mod status;
mod store;
mod watcher;

use config::Config;
use watcher::Watcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {:#}. Exiting.", e);
        return Err(e);
    }

    if config.dry_run {
        info!("🟡 DRY RUN mode – updates are logged, nothing is sent to Telegram");
    }

    let watcher = match Watcher::from_config(&config) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to start: {:#}. Exiting.", e);
            return Err(e);
        }
    };

    let report = watcher.run_once().await;
    info!(
        "Run complete: {} checked, {} changed, {} message(s) sent, {} failed",
        report.checked,
        report.changed.len(),
        report.delivery.sent,
        report.delivery.failed
    );
    if !report.snapshot_saved {
        error!("Snapshot was not updated; the next run may repeat these updates");
    }

    Ok(())
}
