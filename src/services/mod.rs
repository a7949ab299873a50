// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - feed access, normalization and sync logic.

pub mod archiver;
pub mod enrich;
pub mod lastfm;
pub mod normalize;
pub mod retry;

pub use archiver::{Archiver, ScrobbleFeed};
pub use enrich::{ArtistEnricher, EnrichReport, TagSource};
pub use lastfm::{FeedPage, LastfmClient};
pub use retry::{RetryPolicy, Retried};
