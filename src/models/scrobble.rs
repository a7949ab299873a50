// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scrobble model for storage.

use serde::{Deserialize, Serialize};

/// Placeholder stored when a record has no artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Placeholder stored when a record has no track name.
pub const UNKNOWN_TRACK: &str = "Unknown Track";

/// One played track, as stored in the `scrobbles` table.
///
/// Optional text fields are stored as empty strings rather than NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scrobble {
    /// Unix timestamp of the play (primary key)
    pub timestamp: i64,
    /// Artist name
    pub artist: String,
    /// Album title (may be empty)
    pub album: String,
    /// Track title
    pub track: String,
    /// MusicBrainz album ID (may be empty)
    pub album_mbid: String,
    /// MusicBrainz artist ID (may be empty)
    pub artist_mbid: String,
    /// MusicBrainz recording ID (may be empty)
    pub track_mbid: String,
    /// Whether the user has loved this track
    pub loved: bool,
    /// When this row was fetched (RFC 3339, UTC)
    pub date_archived: String,
}
