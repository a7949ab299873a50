// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scrobble-Archiver: keep a local SQLite copy of a Last.fm listening history
//!
//! This crate fetches new scrobbles incrementally, normalizes the API's
//! inconsistent record shapes and stores each play exactly once.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod time_utils;
