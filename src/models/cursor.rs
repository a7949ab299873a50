//! Resume point for incremental syncs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Inclusive lower bound for the next fetch: the newest timestamp already
/// archived, or [`ResumePoint::BEGINNING`] for an empty archive.
///
/// Because the bound is inclusive the newest stored scrobble is fetched
/// again on every run; the insert path discards it as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ResumePoint(i64);

impl ResumePoint {
    /// Nothing archived yet; fetch the full history.
    pub const BEGINNING: ResumePoint = ResumePoint(0);

    pub fn new(timestamp: i64) -> Self {
        Self(timestamp.max(0))
    }

    /// Build from the result of `MAX(timestamp)` on the archive.
    pub fn from_latest(latest: Option<i64>) -> Self {
        latest.map(Self::new).unwrap_or(Self::BEGINNING)
    }

    pub fn as_unix(self) -> i64 {
        self.0
    }

    pub fn is_beginning(self) -> bool {
        self == Self::BEGINNING
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if self.is_beginning() {
            None
        } else {
            DateTime::from_timestamp(self.0, 0)
        }
    }
}

impl fmt::Display for ResumePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(date) => write!(f, "{} ({})", self.0, date.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{} (never)", self.0),
        }
    }
}
