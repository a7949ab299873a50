// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use scrobble_archiver::db::ScrobbleDb;
use scrobble_archiver::error::{AppError, Result};
use scrobble_archiver::models::ResumePoint;
use scrobble_archiver::services::{Archiver, FeedPage, RetryPolicy, ScrobbleFeed};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Raw extended-format `recenttracks` entry.
#[allow(dead_code)]
pub fn track_json(timestamp: i64, artist: &str, track: &str) -> Value {
    json!({
        "artist": {"name": artist, "mbid": ""},
        "album": {"#text": "Album", "mbid": ""},
        "name": track,
        "mbid": "",
        "loved": "0",
        "date": {"uts": timestamp.to_string(), "#text": ""}
    })
}

/// Entry for the track currently playing.
#[allow(dead_code)]
pub fn now_playing_json(artist: &str, track: &str) -> Value {
    json!({
        "artist": {"name": artist},
        "name": track,
        "@attr": {"nowplaying": "true"}
    })
}

/// One feed page of sequential tracks.
#[allow(dead_code)]
pub fn page_of(timestamps: impl IntoIterator<Item = i64>, total_pages: u32) -> FeedPage {
    FeedPage::new(
        timestamps
            .into_iter()
            .map(|ts| track_json(ts, "Artist", &format!("Track {}", ts)))
            .collect(),
        total_pages,
    )
}

/// Feed that replays a fixed script of responses and records every request.
///
/// Once the script runs out, every further request returns an empty page.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct ScriptedFeed {
    responses: Arc<Mutex<VecDeque<Result<FeedPage>>>>,
    requests: Arc<Mutex<Vec<(ResumePoint, u32)>>>,
    request_times: Arc<Mutex<Vec<Instant>>>,
}

#[allow(dead_code)]
impl ScriptedFeed {
    pub fn new(responses: impl IntoIterator<Item = Result<FeedPage>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            requests: Arc::default(),
            request_times: Arc::default(),
        }
    }

    pub fn pages(pages: impl IntoIterator<Item = FeedPage>) -> Self {
        Self::new(pages.into_iter().map(Ok))
    }

    pub fn push(&self, response: Result<FeedPage>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<(ResumePoint, u32)> {
        self.requests.lock().unwrap().clone()
    }

    /// Time between consecutive requests.
    pub fn request_gaps(&self) -> Vec<Duration> {
        self.request_times
            .lock()
            .unwrap()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[async_trait]
impl ScrobbleFeed for ScriptedFeed {
    async fn fetch_page(&self, from: ResumePoint, page: u32) -> Result<FeedPage> {
        self.requests.lock().unwrap().push((from, page));
        self.request_times.lock().unwrap().push(Instant::now());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FeedPage::default()))
    }
}

/// A transient failure, as a timed-out request would produce.
#[allow(dead_code)]
pub fn transient_error() -> AppError {
    AppError::Transport("timed out".to_string())
}

/// Archiver over an in-memory archive with no politeness delay.
#[allow(dead_code)]
pub fn test_archiver(feed: ScriptedFeed) -> Archiver<ScriptedFeed> {
    let db = ScrobbleDb::open_in_memory().expect("Failed to open in-memory archive");
    Archiver::new(feed, db, RetryPolicy::default(), Duration::ZERO)
}
