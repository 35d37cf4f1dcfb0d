//! Crash-details ingestion driver (second pass).
//!
//! Walks the stored crashes by surrogate id and fetches per-case detail
//! attributes. An upstream "not found" leaves the detail row absent and
//! moves on to the next id; only a source failure aborts the window.

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, Cursor, Stream};
use crate::client::CrashApiClient;
use crate::error::IngestError;
use crate::ingest::{WindowOutcome, WindowStats};
use crate::normalize::normalize_detail;
use crate::storage::repository::CaseRef;
use crate::storage::CrashRepository;
use crate::types::CrashResultSet;

/// Run one crash-details ingestion window.
pub async fn run(
    repo: &CrashRepository,
    checkpoints: &CheckpointStore,
    client: &CrashApiClient,
    batch_size: u32,
) -> anyhow::Result<WindowOutcome> {
    // Crash surrogate ids are 1-based rowids.
    let cursor = checkpoints.read_or(Stream::CrashDetails, Cursor::Offset(1))?;
    let start_id = cursor
        .as_offset()
        .context("crash details checkpoint is not an offset cursor")? as i64;

    let refs = repo.get_case_refs(start_id, batch_size)?;
    let exhausted = (refs.len() as u32) < batch_size;
    debug!(start_id, window = refs.len(), "details window loaded");

    let mut stats = WindowStats::default();
    for case in &refs {
        let details = match client
            .fetch_case_details(case.st_case, &case.case_year, case.state)
            .await
        {
            Ok(details) => details,
            Err(IngestError::SourceUnavailable(msg)) => {
                // Abort with the checkpoint untouched; already-written
                // details are idempotent on the next run.
                anyhow::bail!("case details fetch failed: {}", msg);
            }
            Err(e) => {
                warn!(crash_id = case.crash_id, error = %e, "detail fetch failed for case");
                stats.failed += 1;
                continue;
            }
        };
        apply_detail(repo, case, details.as_ref(), &mut stats);
    }

    let new_cursor = next_cursor(cursor, batch_size, exhausted, &refs);
    if new_cursor != cursor {
        checkpoints.write(Stream::CrashDetails, new_cursor)?;
    }

    if exhausted {
        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            "details pass caught up with stored crashes"
        );
        Ok(WindowOutcome::Exhausted {
            cursor: new_cursor,
            stats,
        })
    } else {
        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            cursor = %new_cursor,
            "details window complete"
        );
        Ok(WindowOutcome::Advanced {
            cursor: new_cursor,
            stats,
        })
    }
}

/// Normalize and insert one detail record, or record the skip when
/// upstream has no detail for the case. No placeholder rows are written.
pub(crate) fn apply_detail(
    repo: &CrashRepository,
    case: &CaseRef,
    details: Option<&CrashResultSet>,
    stats: &mut WindowStats,
) {
    let Some(result_set) = details else {
        debug!(
            crash_id = case.crash_id,
            st_case = case.st_case,
            "case not found upstream, leaving detail absent"
        );
        stats.skipped += 1;
        return;
    };

    match normalize_detail(repo, case.crash_id, result_set) {
        Ok(row) => match repo.insert_crash_detail(&row) {
            Ok(true) => {
                stats.processed += 1;
            }
            Ok(false) => {
                debug!(crash_id = case.crash_id, "detail already stored, ignoring");
                stats.processed += 1;
            }
            Err(e) => {
                warn!(crash_id = case.crash_id, error = %e, "failed to store detail");
                stats.failed += 1;
            }
        },
        Err(IngestError::MalformedPayload(msg)) => {
            warn!(crash_id = case.crash_id, "skipping malformed detail: {}", msg);
            stats.skipped += 1;
        }
        Err(e) => {
            warn!(crash_id = case.crash_id, error = %e, "failed to normalize detail");
            stats.failed += 1;
        }
    }
}

/// New cursor after a details window: one full batch ahead for a full
/// window, otherwise just past the last stored crash id.
pub(crate) fn next_cursor(
    cursor: Cursor,
    batch_size: u32,
    exhausted: bool,
    refs: &[CaseRef],
) -> Cursor {
    if !exhausted {
        return cursor.advance(batch_size as u64);
    }
    match refs.last() {
        Some(last) => Cursor::Offset(last.crash_id as u64 + 1),
        None => cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::storage::repository::CrashRow;

    fn seed_crash(repo: &CrashRepository, st_case: i64) -> CaseRef {
        let row = CrashRow {
            county_id: repo.resolve_county("WAYNE (163)").unwrap(),
            crash_date: NaiveDate::from_ymd_opt(2014, 1, 1)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap(),
            fatals: 1,
            peds: 0,
            persons: 2,
            st_case,
            state: 26,
            total_vehicles: 1,
        };
        repo.insert_crash(&row).unwrap();
        let (crash_id, _) = repo.get_crash_by_case(st_case).unwrap().unwrap();
        CaseRef {
            crash_id,
            st_case,
            state: 26,
            case_year: "2014".to_string(),
        }
    }

    fn result_set(weekday: i64) -> CrashResultSet {
        CrashResultSet {
            drunk_dr: 1,
            typ_intname: "Four-Way Intersection".to_string(),
            day_week: weekday,
        }
    }

    #[test]
    fn test_not_found_leaves_detail_absent_and_continues() {
        let repo = CrashRepository::in_memory().unwrap();
        let missing = seed_crash(&repo, 260042);
        let present = seed_crash(&repo, 260043);

        let mut stats = WindowStats::default();
        apply_detail(&repo, &missing, None, &mut stats);
        apply_detail(&repo, &present, Some(&result_set(4)), &mut stats);

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.processed, 1);
        assert!(!repo.detail_exists(missing.crash_id).unwrap());
        assert!(repo.detail_exists(present.crash_id).unwrap());
    }

    #[test]
    fn test_malformed_weekday_is_skipped_without_placeholder() {
        let repo = CrashRepository::in_memory().unwrap();
        let case = seed_crash(&repo, 260042);

        let mut stats = WindowStats::default();
        apply_detail(&repo, &case, Some(&result_set(9)), &mut stats);

        assert_eq!(stats.skipped, 1);
        assert!(!repo.detail_exists(case.crash_id).unwrap());
    }

    #[test]
    fn test_detail_resolves_intersection_dimension_first() {
        let repo = CrashRepository::in_memory().unwrap();
        let case = seed_crash(&repo, 260042);

        let mut stats = WindowStats::default();
        apply_detail(&repo, &case, Some(&result_set(4)), &mut stats);

        assert_eq!(repo.counts().unwrap().intersection_types, 1);
        assert_eq!(stats.processed, 1);
    }

    #[test]
    fn test_next_cursor_full_window_advances_one_batch() {
        let repo = CrashRepository::in_memory().unwrap();
        let refs: Vec<_> = (0..3).map(|i| seed_crash(&repo, 260001 + i)).collect();
        let cursor = next_cursor(Cursor::Offset(1), 3, false, &refs);
        assert_eq!(cursor, Cursor::Offset(4));
    }

    #[test]
    fn test_next_cursor_partial_window_stops_at_data_end() {
        let repo = CrashRepository::in_memory().unwrap();
        let refs: Vec<_> = (0..2).map(|i| seed_crash(&repo, 260001 + i)).collect();
        let last_id = refs.last().unwrap().crash_id;
        let cursor = next_cursor(Cursor::Offset(1), 25, true, &refs);
        assert_eq!(cursor, Cursor::Offset(last_id as u64 + 1));
    }

    #[test]
    fn test_next_cursor_empty_window_is_unchanged() {
        let cursor = next_cursor(Cursor::Offset(51), 25, true, &[]);
        assert_eq!(cursor, Cursor::Offset(51));
    }
}
