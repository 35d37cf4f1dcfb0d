//! Crash-list ingestion driver.
//!
//! The Crash API returns the entire matching case list per request, so
//! the window is sliced locally at the checkpointed offset. The cursor
//! advances by the number of records consumed once the loop completes,
//! including over skipped or failed records.

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, Cursor, Stream};
use crate::client::{CaseListQuery, CrashApiClient};
use crate::config::CrashApiConfig;
use crate::error::IngestError;
use crate::ingest::{slice_window, WindowOutcome, WindowStats};
use crate::normalize::normalize_crash;
use crate::storage::CrashRepository;
use crate::types::CaseListEntry;

/// Run one crash-list ingestion window.
pub async fn run(
    repo: &CrashRepository,
    checkpoints: &CheckpointStore,
    client: &CrashApiClient,
    config: &CrashApiConfig,
    batch_size: u32,
) -> anyhow::Result<WindowOutcome> {
    let cursor = checkpoints.read_or(Stream::CrashList, Cursor::Offset(0))?;
    let offset = cursor
        .as_offset()
        .context("crash list checkpoint is not an offset cursor")?;

    let query = CaseListQuery {
        state: config.state,
        from_year: config.from_year,
        to_year: config.to_year,
        min_vehicles: config.min_vehicles,
        max_vehicles: config.max_vehicles,
    };

    // A fetch failure aborts here with the checkpoint untouched.
    let cases = client.fetch_case_list(&query).await?;
    info!(
        total = cases.len(),
        offset, "fetched case list for state {} {}-{}", config.state, config.from_year, config.to_year
    );

    let outcome = consume_window(repo, cursor, &cases, batch_size);

    if outcome.cursor() != cursor {
        checkpoints.write(Stream::CrashList, outcome.cursor())?;
    }

    let stats = outcome.stats();
    if outcome.is_exhausted() {
        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            "case list exhausted for the configured period"
        );
    } else {
        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            cursor = %outcome.cursor(),
            "crash window complete"
        );
    }

    Ok(outcome)
}

/// Consume one window out of the full case list: normalize, resolve the
/// county dimension, and insert each record in source order.
pub(crate) fn consume_window(
    repo: &CrashRepository,
    cursor: Cursor,
    cases: &[CaseListEntry],
    batch_size: u32,
) -> WindowOutcome {
    let offset = cursor.as_offset().unwrap_or(0);
    let (window, exhausted) = slice_window(cases, offset, batch_size);

    let mut stats = WindowStats::default();
    for entry in window {
        match normalize_crash(repo, entry) {
            Ok(row) => match repo.insert_crash(&row) {
                Ok(true) => {
                    stats.processed += 1;
                }
                Ok(false) => {
                    debug!(st_case = row.st_case, "crash already stored, ignoring");
                    stats.processed += 1;
                }
                Err(e) => {
                    warn!(st_case = row.st_case, error = %e, "failed to store crash");
                    stats.failed += 1;
                }
            },
            Err(IngestError::MalformedPayload(msg)) => {
                warn!(st_case = entry.st_case, "skipping malformed case: {}", msg);
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(st_case = entry.st_case, error = %e, "failed to normalize case");
                stats.failed += 1;
            }
        }
    }

    let new_cursor = cursor.advance(window.len() as u64);
    if exhausted {
        WindowOutcome::Exhausted {
            cursor: new_cursor,
            stats,
        }
    } else {
        WindowOutcome::Advanced {
            cursor: new_cursor,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(st_case: i64, county: &str) -> CaseListEntry {
        CaseListEntry {
            county_name: county.to_string(),
            crash_date: "/Date(1388552400000-0500)/".to_string(),
            fatals: 1,
            peds: 0,
            persons: 2,
            st_case,
            state: 26,
            state_name: "Michigan".to_string(),
            total_vehicles: 1,
        }
    }

    #[test]
    fn test_thirty_records_batch_25_processes_first_window() {
        let repo = CrashRepository::in_memory().unwrap();
        let cases: Vec<_> = (0..30).map(|i| entry(260000 + i, "WAYNE (163)")).collect();

        let outcome = consume_window(&repo, Cursor::Offset(0), &cases, 25);

        assert_eq!(outcome.cursor(), Cursor::Offset(25));
        assert_eq!(outcome.stats().processed, 25);
        assert!(!outcome.is_exhausted());
        assert_eq!(repo.counts().unwrap().crashes, 25);
        // Exactly records [0, 25) landed.
        assert!(repo.get_crash_by_case(260024).unwrap().is_some());
        assert!(repo.get_crash_by_case(260025).unwrap().is_none());
    }

    #[test]
    fn test_partial_tail_reports_exhausted_at_data_end() {
        let repo = CrashRepository::in_memory().unwrap();
        let cases: Vec<_> = (0..30).map(|i| entry(260000 + i, "WAYNE (163)")).collect();

        consume_window(&repo, Cursor::Offset(0), &cases, 25);
        let outcome = consume_window(&repo, Cursor::Offset(25), &cases, 25);

        assert!(outcome.is_exhausted());
        // Cursor stops at the actual data end, never past it.
        assert_eq!(outcome.cursor(), Cursor::Offset(30));
        assert_eq!(repo.counts().unwrap().crashes, 30);
    }

    #[test]
    fn test_rerunning_a_window_is_idempotent() {
        let repo = CrashRepository::in_memory().unwrap();
        let cases: Vec<_> = (0..25).map(|i| entry(260000 + i, "WAYNE (163)")).collect();

        consume_window(&repo, Cursor::Offset(0), &cases, 25);
        let rerun = consume_window(&repo, Cursor::Offset(0), &cases, 25);

        assert_eq!(repo.counts().unwrap().crashes, 25);
        // Duplicates count as processed; they are silent no-ops, not errors.
        assert_eq!(rerun.stats().processed, 25);
        assert_eq!(rerun.stats().failed, 0);
    }

    #[test]
    fn test_malformed_record_is_skipped_not_fatal() {
        let repo = CrashRepository::in_memory().unwrap();
        let mut cases: Vec<_> = (0..3).map(|i| entry(260000 + i, "WAYNE (163)")).collect();
        cases[1].crash_date = "garbage".to_string();

        let outcome = consume_window(&repo, Cursor::Offset(0), &cases, 25);

        assert_eq!(outcome.stats().processed, 2);
        assert_eq!(outcome.stats().skipped, 1);
        assert_eq!(repo.counts().unwrap().crashes, 2);
        // The checkpoint still advances over the skipped record.
        assert_eq!(outcome.cursor(), Cursor::Offset(3));
    }

    #[test]
    fn test_shared_county_resolves_to_one_dimension_row() {
        let repo = CrashRepository::in_memory().unwrap();
        let cases = vec![
            entry(260001, "WAYNE (163)"),
            entry(260002, "WAYNE (163)"),
            entry(260003, "OAKLAND (125)"),
        ];

        consume_window(&repo, Cursor::Offset(0), &cases, 25);
        assert_eq!(repo.counts().unwrap().counties, 2);
    }
}
