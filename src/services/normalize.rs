//! Turns raw `recenttracks` entries into [`Scrobble`] rows.
//!
//! Last.fm is inconsistent about shapes: `artist` and `album` arrive as
//! objects or bare strings depending on the `extended` flag and the age of
//! the scrobble, and numeric fields are usually (not always) strings.

use crate::models::scrobble::{UNKNOWN_ARTIST, UNKNOWN_TRACK};
use crate::models::{Scrobble, SkipReason};
use serde_json::{Map, Value};

/// A record that passed normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Track(Scrobble),
    /// Currently playing; no stable timestamp yet.
    NowPlaying,
}

/// Normalize one raw feed record.
pub fn normalize_record(raw: &Value, archived_at: &str) -> Result<Normalized, SkipReason> {
    let record = raw.as_object().ok_or(SkipReason::NotAnObject)?;

    if is_now_playing(record) {
        return Ok(Normalized::NowPlaying);
    }

    let timestamp = extract_timestamp(record)?;
    let (artist, artist_mbid) = name_and_mbid(record.get("artist"), &["name", "#text"]);
    let (album, album_mbid) = name_and_mbid(record.get("album"), &["#text", "name"]);

    Ok(Normalized::Track(Scrobble {
        timestamp,
        artist: artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album: album.unwrap_or_default(),
        track: text(record.get("name")).unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
        album_mbid,
        artist_mbid,
        track_mbid: text(record.get("mbid")).unwrap_or_default(),
        loved: is_loved(record.get("loved")),
        date_archived: archived_at.to_string(),
    }))
}

fn is_now_playing(record: &Map<String, Value>) -> bool {
    match record.get("@attr").and_then(|attr| attr.get("nowplaying")) {
        Some(Value::String(s)) => s == "true",
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

fn extract_timestamp(record: &Map<String, Value>) -> Result<i64, SkipReason> {
    let uts = record
        .get("date")
        .and_then(|date| date.get("uts"))
        .ok_or(SkipReason::MissingTimestamp)?;

    integer(uts).ok_or_else(|| SkipReason::InvalidTimestamp(uts.to_string()))
}

/// Integer from a JSON number or a numeric string.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Scalar JSON rendered as text; null and containers count as absent.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Name and MusicBrainz ID from a field that is either an object (name under
/// one of `name_keys`) or a bare string.
fn name_and_mbid(value: Option<&Value>, name_keys: &[&str]) -> (Option<String>, String) {
    match value {
        Some(Value::Object(fields)) => {
            let name = name_keys.iter().find_map(|key| text(fields.get(*key)));
            let mbid = text(fields.get("mbid")).unwrap_or_default();
            (name, mbid)
        }
        other => (text(other), String::new()),
    }
}

fn is_loved(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s == "1",
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}
