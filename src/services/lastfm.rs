// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Last.fm API client for reading scrobbles and artist tags.
//!
//! Handles:
//! - Paginated `user.getrecenttracks` requests
//! - `artist.gettoptags` lookups for enrichment
//! - Error payloads, whether they arrive with HTTP 200 or a 4xx status

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ResumePoint;
use crate::services::normalize::integer;
use serde_json::Value;

/// Tags kept per artist.
pub const MAX_ARTIST_TAGS: usize = 10;

/// Last.fm API client.
#[derive(Clone)]
pub struct LastfmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    username: String,
    page_size: u32,
}

impl LastfmClient {
    /// Create a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client setup: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            api_key: config.lastfm_api_key.clone(),
            username: config.lastfm_username.clone(),
            page_size: config.page_size,
        })
    }

    /// Fetch one page of recent tracks played at or after `from`.
    ///
    /// Single attempt; retrying is the caller's decision.
    pub async fn get_recent_tracks(&self, from: ResumePoint, page: u32) -> Result<FeedPage> {
        let payload = self
            .get_json(&[
                ("method", "user.getrecenttracks".to_string()),
                ("user", self.username.clone()),
                ("limit", self.page_size.to_string()),
                ("page", page.to_string()),
                ("from", from.as_unix().to_string()),
                ("extended", "1".to_string()),
            ])
            .await?;

        FeedPage::from_payload(payload)
    }

    /// Top tags for an artist, lowercased, most popular first.
    pub async fn get_artist_top_tags(&self, artist: &str) -> Result<Vec<String>> {
        let payload = self
            .get_json(&[
                ("method", "artist.gettoptags".to_string()),
                ("artist", artist.to_string()),
                ("limit", MAX_ARTIST_TAGS.to_string()),
            ])
            .await?;

        Ok(parse_top_tags(payload))
    }

    /// GET with the common parameters and a JSON body.
    async fn get_json(&self, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
            .query(params)
            .send()
            .await?;

        let payload = self.check_response_json(response).await?;
        check_api_error(&payload)?;
        Ok(payload)
    }

    /// Check response status and parse JSON body.
    async fn check_response_json(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Last.fm rate limit hit (429)");
            }

            // Error payloads also arrive with 4xx statuses (e.g. 403 for a bad key).
            if let Ok(payload) = serde_json::from_str::<Value>(&body) {
                check_api_error(&payload)?;
            }

            return Err(AppError::LastfmHttp {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("JSON parse error: {}", e)))
    }
}

/// Last.fm reports failures as `{"error": code, "message": "..."}`, often
/// with a 200 status.
fn check_api_error(payload: &Value) -> Result<()> {
    match payload.get("error") {
        Some(code) => Err(AppError::LastfmApi {
            code: integer(code).unwrap_or(-1),
            message: payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message")
                .to_string(),
        }),
        None => Ok(()),
    }
}

/// One page of raw `recenttracks` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    /// Raw track records, normalized downstream
    pub records: Vec<Value>,
    /// Total pages reported by the feed; 0 if it did not say
    pub total_pages: u32,
}

impl FeedPage {
    pub fn new(records: Vec<Value>, total_pages: u32) -> Self {
        Self {
            records,
            total_pages,
        }
    }

    /// Extract records and pagination from a `user.getrecenttracks` payload.
    ///
    /// A missing `recenttracks` object yields an empty page. `track` may be a
    /// list or, for single-result pages, a bare object.
    pub fn from_payload(mut payload: Value) -> Result<Self> {
        check_api_error(&payload)?;

        let Some(recent) = payload.get_mut("recenttracks") else {
            return Ok(Self::default());
        };
        if !recent.is_object() {
            return Err(AppError::MalformedResponse(format!(
                "recenttracks is not an object: {}",
                recent
            )));
        }

        let total_pages = recent
            .get("@attr")
            .and_then(|attr| attr.get("totalPages"))
            .and_then(integer)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);

        let records = one_or_many(recent.get_mut("track").map(Value::take));

        Ok(Self {
            records,
            total_pages,
        })
    }

    /// Whether `page` is the last page the feed reported.
    pub fn is_last(&self, page: u32) -> bool {
        page >= self.total_pages
    }
}

fn one_or_many(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

fn parse_top_tags(payload: Value) -> Vec<String> {
    let tags = one_or_many(
        payload
            .get("toptags")
            .and_then(|toptags| toptags.get("tag"))
            .cloned(),
    );

    tags.iter()
        .filter_map(|tag| tag.get("name").and_then(Value::as_str))
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .take(MAX_ARTIST_TAGS)
        .collect()
}
