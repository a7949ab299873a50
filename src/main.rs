// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scrobble-Archiver
//!
//! Archives a Last.fm user's scrobbles into a local SQLite database.
//! Meant to run as a scheduled, non-overlapping job.

use anyhow::Context;
use scrobble_archiver::{
    config::Config,
    db::ScrobbleDb,
    logging::init_logging,
    services::{Archiver, LastfmClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.log_format);
    tracing::info!(
        user = %config.lastfm_username,
        db = %config.db_path.display(),
        "Starting Last.fm archival"
    );

    // Storage problems are fatal before any request is made
    let db = ScrobbleDb::open(&config.db_path).context("Failed to open scrobble archive")?;
    let client = LastfmClient::new(&config)?;

    let mut archiver = Archiver::from_config(client, db, &config);
    let report = archiver.run().await.context("Archive run failed")?;

    println!(
        "Archive complete. Total new scrobbles: {}",
        report.inserted()
    );
    if !report.records.skipped.is_empty() {
        println!("Skipped {} malformed scrobbles", report.records.skipped.len());
    }
    println!(
        "Database now contains {} total scrobbles",
        report.archive.total_scrobbles
    );
    if let Some(range) = report.archive.date_range() {
        println!("Date range: {}", range);
    }

    Ok(())
}
