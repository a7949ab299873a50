// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite archive with typed operations.
//!
//! Provides:
//! - Scrobbles (insert-once rows keyed by play timestamp)
//! - Resume point and archive statistics
//! - Artist tags (enrichment, kept out of the scrobble rows)

use crate::db::tables;
use crate::error::AppError;
use crate::models::{ArchiveStats, ArtistTags, RecordOutcome, ResumePoint, Scrobble};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS scrobbles (
    timestamp INTEGER PRIMARY KEY,
    artist TEXT NOT NULL,
    album TEXT,
    track TEXT NOT NULL,
    album_mbid TEXT,
    artist_mbid TEXT,
    track_mbid TEXT,
    loved INTEGER DEFAULT 0,
    date_archived TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_artist ON scrobbles(artist);
CREATE INDEX IF NOT EXISTS idx_track ON scrobbles(track);
CREATE INDEX IF NOT EXISTS idx_timestamp ON scrobbles(timestamp);

CREATE TABLE IF NOT EXISTS artist_tags (
    artist TEXT PRIMARY KEY,
    tags TEXT NOT NULL,
    kid_music INTEGER NOT NULL DEFAULT 0,
    enriched_at TEXT NOT NULL
);
"#;

/// SQLite scrobble archive. Single writer, single process.
pub struct ScrobbleDb {
    conn: Connection,
}

impl ScrobbleDb {
    /// Open (or create) the archive at `path`, creating parent directories
    /// and the schema as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            AppError::Database(format!("Failed to open {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Opened scrobble archive");

        Self::with_connection(conn)
    }

    /// In-memory archive for tests.
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ─── Scrobbles ───────────────────────────────────────────────────────────

    /// Newest archived timestamp, or the beginning of time for an empty archive.
    pub fn resume_point(&self) -> Result<ResumePoint, AppError> {
        let latest: Option<i64> = self.conn.query_row(
            &format!("SELECT MAX(timestamp) FROM {}", tables::SCROBBLES),
            [],
            |row| row.get(0),
        )?;
        Ok(ResumePoint::from_latest(latest))
    }

    /// Insert one scrobble. An existing row with the same timestamp is left
    /// untouched and reported as [`RecordOutcome::Duplicate`].
    pub fn insert_scrobble(&self, scrobble: &Scrobble) -> Result<RecordOutcome, AppError> {
        insert_into(&self.conn, scrobble)
    }

    /// Insert a page of scrobbles in one transaction, returning one outcome
    /// per input in order.
    pub fn insert_scrobbles(
        &mut self,
        scrobbles: &[Scrobble],
    ) -> Result<Vec<RecordOutcome>, AppError> {
        let tx = self.conn.transaction()?;
        let outcomes = scrobbles
            .iter()
            .map(|scrobble| insert_into(&tx, scrobble))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(outcomes)
    }

    pub fn get_scrobble(&self, timestamp: i64) -> Result<Option<Scrobble>, AppError> {
        let scrobble = self
            .conn
            .query_row(
                &format!(
                    "SELECT timestamp, artist, album, track, album_mbid, artist_mbid, track_mbid, loved, date_archived
                     FROM {} WHERE timestamp = ?1",
                    tables::SCROBBLES
                ),
                [timestamp],
                scrobble_from_row,
            )
            .optional()?;
        Ok(scrobble)
    }

    /// Row count and stored timestamp range.
    pub fn archive_stats(&self) -> Result<ArchiveStats, AppError> {
        let stats = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), MIN(timestamp), MAX(timestamp) FROM {}",
                tables::SCROBBLES
            ),
            [],
            |row| {
                Ok(ArchiveStats {
                    total_scrobbles: row.get::<_, i64>(0)? as u64,
                    earliest: row.get(1)?,
                    latest: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    // ─── Artist tags ─────────────────────────────────────────────────────────

    /// Artists with at least `min_plays` scrobbles that have no tags yet,
    /// most played first.
    pub fn artists_needing_tags(&self, min_plays: u32) -> Result<Vec<(String, u64)>, AppError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT s.artist, COUNT(*) AS plays
             FROM {scrobbles} s
             LEFT JOIN {tags} t ON t.artist = s.artist
             WHERE t.artist IS NULL
             GROUP BY s.artist
             HAVING plays >= ?1
             ORDER BY plays DESC, s.artist ASC",
            scrobbles = tables::SCROBBLES,
            tags = tables::ARTIST_TAGS,
        ))?;
        let artists = stmt
            .query_map([min_plays], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    pub fn save_artist_tags(&self, tags: &ArtistTags) -> Result<(), AppError> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (artist, tags, kid_music, enriched_at)
                 VALUES (?1, ?2, ?3, ?4)",
                tables::ARTIST_TAGS
            ),
            params![
                tags.artist,
                tags.joined_tags(),
                tags.kid_music,
                tags.enriched_at
            ],
        )?;
        Ok(())
    }

    pub fn get_artist_tags(&self, artist: &str) -> Result<Option<ArtistTags>, AppError> {
        let tags = self
            .conn
            .query_row(
                &format!(
                    "SELECT artist, tags, kid_music, enriched_at FROM {} WHERE artist = ?1",
                    tables::ARTIST_TAGS
                ),
                [artist],
                |row| {
                    let joined: String = row.get(1)?;
                    Ok(ArtistTags {
                        artist: row.get(0)?,
                        tags: joined
                            .split(',')
                            .filter(|t| !t.is_empty())
                            .map(str::to_string)
                            .collect(),
                        kid_music: row.get(2)?,
                        enriched_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(tags)
    }
}

/// Nullable text columns read back as empty strings.
fn scrobble_from_row(row: &Row<'_>) -> rusqlite::Result<Scrobble> {
    Ok(Scrobble {
        timestamp: row.get(0)?,
        artist: row.get(1)?,
        album: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        track: row.get(3)?,
        album_mbid: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        artist_mbid: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        track_mbid: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        loved: row.get::<_, Option<i64>>(7)?.unwrap_or(0) != 0,
        date_archived: row.get(8)?,
    })
}

fn insert_into(conn: &Connection, scrobble: &Scrobble) -> Result<RecordOutcome, AppError> {
    let result = conn.execute(
        &format!(
            "INSERT INTO {}
             (timestamp, artist, album, track, album_mbid, artist_mbid, track_mbid, loved, date_archived)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            tables::SCROBBLES
        ),
        params![
            scrobble.timestamp,
            scrobble.artist,
            scrobble.album,
            scrobble.track,
            scrobble.album_mbid,
            scrobble.artist_mbid,
            scrobble.track_mbid,
            scrobble.loved,
            scrobble.date_archived,
        ],
    );

    match result {
        Ok(_) => Ok(RecordOutcome::Inserted(scrobble.timestamp)),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(RecordOutcome::Duplicate(scrobble.timestamp))
        }
        Err(e) => Err(e.into()),
    }
}
