//! Artist tag model for archive enrichment.

use serde::{Deserialize, Serialize};

/// Tags that mark an artist as children's music.
pub const KID_TAGS: [&str; 11] = [
    "children",
    "kids",
    "childrens music",
    "kids music",
    "lullaby",
    "lullabies",
    "nursery rhymes",
    "educational",
    "toddler",
    "baby",
    "preschool",
];

/// Top tags for one artist, stored in `artist_tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistTags {
    /// Artist name, as it appears in `scrobbles.artist`
    pub artist: String,
    /// Lowercased tag names, most popular first
    pub tags: Vec<String>,
    /// Any tag is in [`KID_TAGS`]
    pub kid_music: bool,
    /// When the tags were fetched (RFC 3339, UTC)
    pub enriched_at: String,
}

impl ArtistTags {
    pub fn new(artist: impl Into<String>, tags: Vec<String>, enriched_at: String) -> Self {
        let kid_music = is_kid_music(&tags);
        Self {
            artist: artist.into(),
            tags,
            kid_music,
            enriched_at,
        }
    }

    /// Comma-joined form used for storage.
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}

pub fn is_kid_music<S: AsRef<str>>(tags: &[S]) -> bool {
    tags.iter()
        .any(|tag| KID_TAGS.contains(&tag.as_ref().trim().to_lowercase().as_str()))
}
