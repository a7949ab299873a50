//! Artist tag enrichment.
//!
//! Fetches top tags for frequently played artists that have none yet and
//! stores them alongside the archive.

use crate::db::ScrobbleDb;
use crate::error::Result;
use crate::models::ArtistTags;
use crate::services::lastfm::LastfmClient;
use crate::time_utils::archive_timestamp;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Pause between consecutive tag lookups.
pub const DEFAULT_TAG_DELAY: Duration = Duration::from_millis(200);

/// Source of per-artist tags.
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn top_tags(&self, artist: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl TagSource for LastfmClient {
    async fn top_tags(&self, artist: &str) -> Result<Vec<String>> {
        self.get_artist_top_tags(artist).await
    }
}

/// Counts from one enrichment run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    /// Artists that received a tags row
    pub artists: usize,
    /// Of those, flagged as children's music
    pub kid_music: usize,
    /// Lookups that failed and were stored with no tags
    pub failed_lookups: usize,
}

pub struct ArtistEnricher<T> {
    source: T,
    delay: Duration,
}

impl<T: TagSource> ArtistEnricher<T> {
    pub fn new(source: T, delay: Duration) -> Self {
        Self { source, delay }
    }

    /// Tag every artist with at least `min_plays` scrobbles and no tags yet.
    ///
    /// A failed lookup is stored as an empty tag list so the artist is not
    /// retried on every run.
    pub async fn enrich(&self, db: &ScrobbleDb, min_plays: u32) -> Result<EnrichReport> {
        let artists = db.artists_needing_tags(min_plays)?;
        let total = artists.len();
        tracing::info!(total, min_plays, "Found artists to enrich");

        let mut report = EnrichReport::default();
        for (index, (artist, plays)) in artists.into_iter().enumerate() {
            let tags = match self.source.top_tags(&artist).await {
                Ok(tags) => tags,
                Err(e) => {
                    tracing::warn!(artist = %artist, error = %e, "Failed to fetch artist tags");
                    report.failed_lookups += 1;
                    Vec::new()
                }
            };

            let tags = ArtistTags::new(artist, tags, archive_timestamp());
            db.save_artist_tags(&tags)?;
            tracing::info!(
                progress = %format!("{}/{}", index + 1, total),
                artist = %tags.artist,
                plays,
                tags = %tags.joined_tags(),
                kid_music = tags.kid_music,
                "Enriched artist"
            );

            report.artists += 1;
            if tags.kid_music {
                report.kid_music += 1;
            }

            if index + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(report)
    }
}
