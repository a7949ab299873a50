// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental scrobble archiver.
//!
//! Handles the core workflow:
//! 1. Determine the resume point from the archive
//! 2. Fetch feed pages in order, retrying transient failures
//! 3. Normalize each record and insert it once, keyed by timestamp
//! 4. Stop on an empty page or the last reported page
//! 5. Report totals and the archived date range

use crate::config::Config;
use crate::db::ScrobbleDb;
use crate::error::Result;
use crate::models::{BatchSummary, RecordOutcome, ResumePoint, SyncReport};
use crate::services::lastfm::{FeedPage, LastfmClient};
use crate::services::normalize::{normalize_record, Normalized};
use crate::services::retry::{with_backoff, RetryPolicy, Retried};
use crate::time_utils::archive_timestamp;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Source of paginated scrobble records.
#[async_trait]
pub trait ScrobbleFeed: Send + Sync {
    /// Fetch one page (1-indexed) of records played at or after `from`.
    /// A single attempt; the archiver owns retrying.
    async fn fetch_page(&self, from: ResumePoint, page: u32) -> Result<FeedPage>;
}

#[async_trait]
impl ScrobbleFeed for LastfmClient {
    async fn fetch_page(&self, from: ResumePoint, page: u32) -> Result<FeedPage> {
        self.get_recent_tracks(from, page).await
    }
}

/// Copies new scrobbles from a feed into the archive.
pub struct Archiver<F> {
    feed: F,
    db: ScrobbleDb,
    retry: RetryPolicy,
    /// Pause between consecutive page requests.
    page_delay: Duration,
}

impl<F: ScrobbleFeed> Archiver<F> {
    pub fn new(feed: F, db: ScrobbleDb, retry: RetryPolicy, page_delay: Duration) -> Self {
        Self {
            feed,
            db,
            retry,
            page_delay,
        }
    }

    pub fn from_config(feed: F, db: ScrobbleDb, config: &Config) -> Self {
        Self::new(feed, db, RetryPolicy::from_config(config), config.page_delay)
    }

    pub fn db(&self) -> &ScrobbleDb {
        &self.db
    }

    pub fn into_db(self) -> ScrobbleDb {
        self.db
    }

    /// Resume point for the next run: the newest archived timestamp.
    pub fn starting_point(&self) -> Result<ResumePoint> {
        self.db.resume_point()
    }

    /// Fetch one page, retrying transient failures with exponential backoff.
    pub async fn fetch_page(&self, from: ResumePoint, page: u32) -> Result<Retried<FeedPage>> {
        with_backoff(&self.retry, "user.getrecenttracks", || {
            self.feed.fetch_page(from, page)
        })
        .await
    }

    /// Normalize a page of raw records and insert the valid ones.
    ///
    /// Malformed records are skipped and logged; only storage failures
    /// return an error.
    pub fn store_page(&mut self, records: &[Value]) -> Result<BatchSummary> {
        let archived_at = archive_timestamp();
        let mut summary = BatchSummary::default();
        let mut pending = Vec::with_capacity(records.len());

        for raw in records {
            match normalize_record(raw, &archived_at) {
                Ok(Normalized::Track(scrobble)) => pending.push(scrobble),
                Ok(Normalized::NowPlaying) => summary.record(RecordOutcome::NowPlaying),
                Err(reason) => {
                    tracing::warn!(reason = %reason, record = %raw, "Skipping malformed scrobble");
                    summary.record(RecordOutcome::Skipped(reason));
                }
            }
        }

        for outcome in self.db.insert_scrobbles(&pending)? {
            summary.record(outcome);
        }

        Ok(summary)
    }

    /// Full sync starting from an explicit resume point.
    pub async fn sync_from(&mut self, from: ResumePoint) -> Result<SyncReport> {
        let mut report = SyncReport {
            resumed_from: from,
            ..Default::default()
        };
        let mut page = 1u32;

        loop {
            tracing::info!(page, from = from.as_unix(), "Fetching page");
            let Retried {
                value: feed_page,
                retries,
            } = self.fetch_page(from, page).await?;
            report.pages_fetched += 1;
            report.retries += retries;

            if feed_page.records.is_empty() {
                tracing::info!(page, "Empty page, nothing more to fetch");
                break;
            }

            let summary = self.store_page(&feed_page.records)?;
            tracing::info!(
                page,
                total_pages = feed_page.total_pages,
                inserted = summary.inserted,
                duplicates = summary.duplicates,
                skipped = summary.skipped.len(),
                "Stored page"
            );
            report.absorb(summary);

            if feed_page.is_last(page) {
                break;
            }

            page += 1;
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        report.archive = self.db.archive_stats()?;
        tracing::info!(
            inserted = report.inserted(),
            pages = report.pages_fetched,
            total = report.archive.total_scrobbles,
            "Sync complete"
        );
        Ok(report)
    }

    /// Full sync from wherever the archive left off.
    pub async fn run(&mut self) -> Result<SyncReport> {
        let from = self.starting_point()?;
        tracing::info!(resume_point = %from, "Last archived timestamp");
        self.sync_from(from).await
    }
}
