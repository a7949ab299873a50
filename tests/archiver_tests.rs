// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental sync tests.
//!
//! These tests verify that:
//! 1. Repeated runs are idempotent and resume from the newest stored play
//! 2. Overlapping pages never produce duplicate rows
//! 3. Malformed records are skipped without failing the run
//! 4. Transient failures are retried with doubling delays
//! 5. Pagination stops on the reported last page or an empty page

use scrobble_archiver::db::ScrobbleDb;
use scrobble_archiver::error::AppError;
use scrobble_archiver::models::{ResumePoint, SkipReason};
use scrobble_archiver::services::{Archiver, FeedPage, RetryPolicy};
use serde_json::json;
use std::time::Duration;

mod common;
use common::{now_playing_json, page_of, test_archiver, track_json, transient_error, ScriptedFeed};

#[tokio::test]
async fn test_second_run_without_new_data_inserts_nothing() {
    let mut archiver = test_archiver(ScriptedFeed::pages([page_of(1..=5, 1)]));
    let first = archiver.run().await.unwrap();
    assert_eq!(first.inserted(), 5);

    // The feed's lower bound is inclusive, so the newest play comes back again.
    let feed = ScriptedFeed::pages([page_of([5], 1)]);
    let mut archiver = Archiver::new(
        feed.clone(),
        archiver.into_db(),
        RetryPolicy::default(),
        Duration::ZERO,
    );
    let second = archiver.run().await.unwrap();

    assert_eq!(second.inserted(), 0);
    assert_eq!(second.records.duplicates, 1);
    assert_eq!(second.archive.total_scrobbles, 5);
    assert_eq!(feed.requests(), vec![(ResumePoint::new(5), 1)]);
}

#[tokio::test]
async fn test_rerun_of_full_history_is_idempotent() {
    let mut archiver = test_archiver(ScriptedFeed::pages([page_of(1..=5, 1)]));
    archiver.run().await.unwrap();

    let mut archiver = Archiver::new(
        ScriptedFeed::pages([page_of(1..=5, 1)]),
        archiver.into_db(),
        RetryPolicy::default(),
        Duration::ZERO,
    );
    let report = archiver.run().await.unwrap();

    assert_eq!(report.inserted(), 0);
    assert_eq!(report.records.duplicates, 5);
    assert_eq!(report.archive.total_scrobbles, 5);
}

#[tokio::test]
async fn test_first_run_starts_at_beginning() {
    let feed = ScriptedFeed::pages([page_of([100, 90], 1)]);
    let mut archiver = test_archiver(feed.clone());

    assert!(archiver.starting_point().unwrap().is_beginning());
    let report = archiver.run().await.unwrap();

    assert_eq!(report.resumed_from, ResumePoint::BEGINNING);
    assert_eq!(feed.requests(), vec![(ResumePoint::BEGINNING, 1)]);
    assert_eq!(archiver.starting_point().unwrap(), ResumePoint::new(100));
}

#[tokio::test]
async fn test_overlapping_pages_store_one_row_per_timestamp() {
    let feed = ScriptedFeed::pages([page_of([10, 9, 8], 2), page_of([8, 7], 2)]);
    let mut archiver = test_archiver(feed);

    let report = archiver.run().await.unwrap();

    assert_eq!(report.inserted(), 4);
    assert_eq!(report.records.duplicates, 1);
    assert_eq!(report.archive.total_scrobbles, 4);
    assert_eq!(report.archive.earliest, Some(7));
    assert_eq!(report.archive.latest, Some(10));
}

#[tokio::test]
async fn test_explicit_resume_point_is_passed_to_feed() {
    let feed = ScriptedFeed::pages([page_of([50], 1)]);
    let mut archiver = test_archiver(feed.clone());

    let report = archiver.sync_from(ResumePoint::new(42)).await.unwrap();

    assert_eq!(report.resumed_from, ResumePoint::new(42));
    assert_eq!(feed.requests(), vec![(ResumePoint::new(42), 1)]);
}

#[tokio::test]
async fn test_malformed_record_is_skipped_not_fatal() {
    let mut records: Vec<_> = (1..=10)
        .map(|ts| track_json(ts, "Artist", "Track"))
        .collect();
    records[4]["date"]["uts"] = json!("not-a-number");

    let mut archiver = test_archiver(ScriptedFeed::pages([FeedPage::new(records, 1)]));
    let report = archiver.run().await.unwrap();

    assert_eq!(report.inserted(), 9);
    assert_eq!(
        report.records.skipped,
        vec![SkipReason::InvalidTimestamp("\"not-a-number\"".to_string())]
    );
    assert!(archiver.db().get_scrobble(5).unwrap().is_none());
    assert_eq!(report.archive.total_scrobbles, 9);
}

#[tokio::test]
async fn test_record_without_date_is_skipped() {
    let records = vec![
        json!({"artist": "Artist", "name": "No date"}),
        track_json(1, "Artist", "Dated"),
    ];

    let mut archiver = test_archiver(ScriptedFeed::pages([FeedPage::new(records, 1)]));
    let report = archiver.run().await.unwrap();

    assert_eq!(report.inserted(), 1);
    assert_eq!(report.records.skipped, vec![SkipReason::MissingTimestamp]);
}

#[tokio::test]
async fn test_now_playing_is_not_archived() {
    let records = vec![
        now_playing_json("Artist", "Live"),
        track_json(2, "Artist", "Two"),
        track_json(1, "Artist", "One"),
    ];

    let mut archiver = test_archiver(ScriptedFeed::pages([FeedPage::new(records, 1)]));
    let report = archiver.run().await.unwrap();

    assert_eq!(report.inserted(), 2);
    assert_eq!(report.records.now_playing, 1);
    assert!(report.records.skipped.is_empty());
}

#[tokio::test]
async fn test_stops_after_reported_total_pages() {
    let feed = ScriptedFeed::pages([
        page_of([30, 29], 3),
        page_of([28, 27], 3),
        page_of([26, 25], 3),
        page_of([24, 23], 3),
    ]);
    let mut archiver = test_archiver(feed.clone());

    let report = archiver.run().await.unwrap();

    let pages: Vec<u32> = feed.requests().into_iter().map(|(_, page)| page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.inserted(), 6);
}

#[tokio::test]
async fn test_stops_on_empty_page() {
    let feed = ScriptedFeed::pages([page_of([2, 1], 5), FeedPage::new(vec![], 5)]);
    let mut archiver = test_archiver(feed.clone());

    let report = archiver.run().await.unwrap();

    assert_eq!(feed.requests().len(), 2);
    assert_eq!(report.inserted(), 2);
}

#[tokio::test]
async fn test_missing_total_pages_stops_after_first_page() {
    let feed = ScriptedFeed::pages([page_of([2, 1], 0), page_of([0], 0)]);
    let mut archiver = test_archiver(feed.clone());

    archiver.run().await.unwrap();

    assert_eq!(feed.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_succeed_matches_immediate_success() {
    let flaky = ScriptedFeed::new([
        Err(transient_error()),
        Err(transient_error()),
        Ok(page_of(1..=3, 1)),
    ]);
    let mut archiver = test_archiver(flaky.clone());

    let started = tokio::time::Instant::now();
    let report = archiver.run().await.unwrap();
    let elapsed = started.elapsed();

    // Backoff of 1s then 2s
    assert_eq!(
        flaky.request_gaps(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
    assert_eq!(report.retries, 2);
    assert_eq!(flaky.requests().len(), 3);

    let mut immediate = test_archiver(ScriptedFeed::pages([page_of(1..=3, 1)]));
    let expected = immediate.run().await.unwrap();

    assert_eq!(report.records, expected.records);
    assert_eq!(report.archive, expected.archive);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_is_fatal() {
    let feed = ScriptedFeed::new([
        Err(transient_error()),
        Err(transient_error()),
        Err(transient_error()),
        Ok(page_of([1], 1)),
    ]);
    let mut archiver = test_archiver(feed.clone());

    let err = archiver.run().await.unwrap_err();

    assert!(matches!(err, AppError::Transport(_)));
    assert_eq!(feed.requests().len(), 3);
    assert_eq!(archiver.db().archive_stats().unwrap().total_scrobbles, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_on_later_page_keeps_earlier_pages() {
    let feed = ScriptedFeed::new([
        Ok(page_of([4, 3], 2)),
        Err(transient_error()),
        Err(transient_error()),
        Err(transient_error()),
    ]);
    let mut archiver = test_archiver(feed);

    assert!(archiver.run().await.is_err());

    // The next run resumes after what the failed run already stored.
    assert_eq!(archiver.starting_point().unwrap(), ResumePoint::new(4));
}

#[tokio::test]
async fn test_permanent_error_is_not_retried() {
    let feed = ScriptedFeed::new([Err(AppError::LastfmApi {
        code: 10,
        message: "Invalid API key".to_string(),
    })]);
    let mut archiver = test_archiver(feed.clone());

    let err = archiver.run().await.unwrap_err();

    assert!(matches!(err, AppError::LastfmApi { code: 10, .. }));
    assert_eq!(feed.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_politeness_delay_between_pages() {
    let feed = ScriptedFeed::pages([page_of([3], 3), page_of([2], 3), page_of([1], 3)]);
    let db = ScrobbleDb::open_in_memory().unwrap();
    let mut archiver = Archiver::new(
        feed,
        db,
        RetryPolicy::default(),
        Duration::from_millis(300),
    );

    let started = tokio::time::Instant::now();
    archiver.run().await.unwrap();

    // Two pauses: after page 1 and after page 2, none after the last page.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(600), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(900), "elapsed {elapsed:?}");
}
