// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod artist;
pub mod cursor;
pub mod scrobble;
pub mod stats;

pub use artist::ArtistTags;
pub use cursor::ResumePoint;
pub use scrobble::Scrobble;
pub use stats::{ArchiveStats, BatchSummary, RecordOutcome, SkipReason, SyncReport};
