// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! journey-replay
//!
//! Replays a newline-delimited JSON file of location fixes through the
//! tracking and sync engines, then prints the recorded journey as GeoJSON.

use anyhow::Context;
use journey_tracker::{
    config::Config,
    db::FileStore,
    models::{LocationFix, PermissionState},
    services::{IngestOutcome, RestGateway, SyncOutcome},
    AppState,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured JSON logs on stderr; stdout carries the GeoJSON
    init_logging();

    let path = std::env::args()
        .nth(1)
        .context("usage: journey-replay <fixes.jsonl>")?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(path = %path, data_dir = %config.data_dir.display(), "Starting journey replay");

    let fixes = read_fixes(Path::new(&path))?;
    tracing::info!(count = fixes.len(), "Fixes loaded");

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open data dir {}", config.data_dir.display()))?;
    let gateway = RestGateway::new(&config.remote_url, config.api_key.clone());

    let state = AppState::new(
        config,
        Arc::new(store),
        Arc::new(gateway),
        true,
        PermissionState::Authorized,
    )
    .context("Failed to load offline queue")?;

    let tracking = state.tracking();
    tracking.start().await?;

    let mut accepted = 0usize;
    for fix in fixes {
        if let IngestOutcome::Accepted { .. } = tracking.ingest(fix).await? {
            accepted += 1;
        }
    }
    tracing::info!(accepted, "Replay complete");

    let journey = state.journeys.finish(None).await?;

    match state.sync.sync_all().await {
        SyncOutcome::Completed(report) => {
            tracing::info!(
                synced = report.synced,
                failed = report.failed,
                pending = state.sync.pending_count(),
                "Sync finished"
            );
        }
        other => tracing::warn!(outcome = ?other, "Sync not run"),
    }

    let feature = journey.to_geojson_feature();
    println!("{}", serde_json::to_string_pretty(&feature)?);
    Ok(())
}

/// Parse one fix per non-empty line.
fn read_fixes(path: &Path) -> anyhow::Result<Vec<LocationFix>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid fix", path.display(), idx + 1))
        })
        .collect()
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("journey_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
