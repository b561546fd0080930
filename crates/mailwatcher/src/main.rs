//! `mailwatcher` - download new mail into a per-sender directory tree.
//!
//! Every run fetches one batch of messages, skips those already recorded in
//! `<basedir>/index.sqlite.db`, and writes the rest under
//! `<basedir>/<sender>/<YYYYMMDD>/`. Runs can be repeated safely.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod export;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailwatcher_core::SyncEngine;

use cli::Cli;
use export::ExportSource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailwatcher=info,mailwatcher_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config().context("invalid arguments")?;
    let index_path = config.index_path.clone();

    info!(
        base_dir = %config.base_dir.display(),
        source = %cli.source.display(),
        "Starting mailwatcher"
    );

    let engine = SyncEngine::new(config)
        .await
        .with_context(|| format!("failed to open index {}", index_path.display()))?;

    let mut source = ExportSource::new(&cli.source, Local::now().date_naive());
    let report = match engine.run(&mut source).await {
        Ok(report) => report,
        Err(e) => {
            if e.is_fatal_invariant() {
                error!(error = %e, "Index out of step with the store; another run may be active");
            } else {
                error!(error = %e, "Sync aborted");
            }
            return Err(anyhow::Error::new(e).context("sync aborted"));
        }
    };

    engine.into_index().close().await;
    println!(
        "{} fetched, {} already present, {} downloaded",
        report.fetched, report.skipped, report.indexed
    );
    Ok(())
}
