// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the archiver and the enricher.

use crate::config::ConfigError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Last.fm request failed: {0}")]
    Transport(String),

    #[error("Last.fm HTTP {status}: {body}")]
    LastfmHttp { status: u16, body: String },

    #[error("Last.fm API error {code}: {message}")]
    LastfmApi { code: i64, message: String },

    #[error("Malformed Last.fm response: {0}")]
    MalformedResponse(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Last.fm error codes that indicate a temporary condition on their side:
    /// operation failed (8), service offline (11), temporarily unavailable (16)
    /// and rate limit exceeded (29).
    pub const LASTFM_TRANSIENT_CODES: [i64; 4] = [8, 11, 16, 29];

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Transport(_) | AppError::LastfmHttp { .. } => true,
            AppError::MalformedResponse(_) => true,
            AppError::LastfmApi { code, .. } => Self::LASTFM_TRANSIENT_CODES.contains(code),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => false,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Transport(format!("timed out: {}", err))
        } else if err.is_decode() {
            AppError::MalformedResponse(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
