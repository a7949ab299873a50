//! Database layer (SQLite).

pub mod sqlite;

pub use sqlite::ScrobbleDb;

/// Table names as constants.
pub mod tables {
    pub const SCROBBLES: &str = "scrobbles";
    /// Per-artist tags from enrichment (keyed by artist name)
    pub const ARTIST_TAGS: &str = "artist_tags";
}
