// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Enrich the scrobble archive with Last.fm artist tags.

use anyhow::Context;
use scrobble_archiver::{
    config::Config,
    db::ScrobbleDb,
    logging::init_logging,
    services::{enrich::DEFAULT_TAG_DELAY, ArtistEnricher, LastfmClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.log_format);

    let db = ScrobbleDb::open(&config.db_path).context("Failed to open scrobble archive")?;
    let client = LastfmClient::new(&config)?;

    tracing::info!(min_plays = config.enrich_min_plays, "Fetching artist metadata from Last.fm");
    let enricher = ArtistEnricher::new(client, DEFAULT_TAG_DELAY);
    let report = enricher
        .enrich(&db, config.enrich_min_plays)
        .await
        .context("Enrichment failed")?;

    println!(
        "Enrichment complete: {} artists tagged, {} flagged as kid music, {} lookups failed",
        report.artists, report.kid_music, report.failed_lookups
    );

    Ok(())
}
