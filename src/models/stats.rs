//! Per-record outcomes and the summaries built from them.
//!
//! The archiver never aborts a page because of one bad record. Instead each
//! record resolves to a [`RecordOutcome`], outcomes are folded into a
//! [`BatchSummary`] per page, and page summaries into a [`SyncReport`].

use chrono::DateTime;
use serde::Serialize;

use crate::models::ResumePoint;

/// Why a raw feed record was not archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum SkipReason {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing date.uts")]
    MissingTimestamp,

    #[error("invalid date.uts: {0}")]
    InvalidTimestamp(String),
}

/// What happened to a single raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Newly stored under this timestamp
    Inserted(i64),
    /// Already archived under this timestamp
    Duplicate(i64),
    /// "Now playing" marker; has no stable timestamp yet
    NowPlaying,
    /// Malformed record, not stored
    Skipped(SkipReason),
}

/// Outcome counts for one page of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub now_playing: usize,
    pub skipped: Vec<SkipReason>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Inserted(_) => self.inserted += 1,
            RecordOutcome::Duplicate(_) => self.duplicates += 1,
            RecordOutcome::NowPlaying => self.now_playing += 1,
            RecordOutcome::Skipped(reason) => self.skipped.push(reason),
        }
    }

    /// Number of raw records this summary accounts for.
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates + self.now_playing + self.skipped.len()
    }
}

impl FromIterator<RecordOutcome> for BatchSummary {
    fn from_iter<I: IntoIterator<Item = RecordOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

/// Size and time span of the archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    pub total_scrobbles: u64,
    pub earliest: Option<i64>,
    pub latest: Option<i64>,
}

impl ArchiveStats {
    /// Human-readable "from to to" range, if the archive is non-empty.
    pub fn date_range(&self) -> Option<String> {
        let earliest = DateTime::from_timestamp(self.earliest?, 0)?;
        let latest = DateTime::from_timestamp(self.latest?, 0)?;
        Some(format!(
            "{} to {}",
            earliest.format("%Y-%m-%d %H:%M:%S"),
            latest.format("%Y-%m-%d %H:%M:%S")
        ))
    }
}

/// Result of one full sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Lower bound the run fetched from
    pub resumed_from: ResumePoint,
    /// Page requests that eventually succeeded
    pub pages_fetched: u32,
    /// Retries spent across all pages
    pub retries: u32,
    /// Combined outcomes of every page
    pub records: BatchSummary,
    /// Archive state after the run
    pub archive: ArchiveStats,
}

impl SyncReport {
    pub fn inserted(&self) -> usize {
        self.records.inserted
    }

    pub fn absorb(&mut self, page: BatchSummary) {
        self.records.inserted += page.inserted;
        self.records.duplicates += page.duplicates;
        self.records.now_playing += page.now_playing;
        self.records.skipped.extend(page.skipped);
    }
}
