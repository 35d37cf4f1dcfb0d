//! Weather ingestion driver.
//!
//! Date-windowed: the cursor records the last day already ingested, and
//! each invocation asks the source for the next `batch_size` days. The
//! weather API windows server-side via the explicit date range.

use anyhow::Context;
use chrono::Days;
use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, Cursor, Stream};
use crate::client::WeatherClient;
use crate::config::WeatherConfig;
use crate::ingest::{WindowOutcome, WindowStats};
use crate::normalize::normalize_weather_day;
use crate::storage::CrashRepository;
use crate::types::WeatherDaily;

/// Run one weather ingestion window.
pub async fn run(
    repo: &CrashRepository,
    checkpoints: &CheckpointStore,
    client: &WeatherClient,
    config: &WeatherConfig,
    batch_size: u32,
) -> anyhow::Result<WindowOutcome> {
    let cursor = checkpoints.read_or(Stream::Weather, Cursor::Date(config.initial_date))?;
    let last_ingested = cursor
        .as_date()
        .context("weather checkpoint is not a date cursor")?;

    let start = last_ingested
        .checked_add_days(Days::new(1))
        .context("weather cursor overflow")?;
    let end = last_ingested
        .checked_add_days(Days::new(batch_size as u64))
        .context("weather cursor overflow")?;

    let rows = client.fetch_daily(&config.point(), start, end).await?;
    debug!(%start, %end, rows = rows.len(), "weather window loaded");

    if rows.is_empty() {
        info!(last = %last_ingested, "no observations past the cursor, weather stream exhausted");
        return Ok(WindowOutcome::Exhausted { cursor, stats: WindowStats::default() });
    }

    let stats = consume_window(repo, &rows);

    // The range end is fully covered once the source answered for it;
    // absent days inside the range stay absent (idempotent re-runs would
    // refetch the same empty days forever otherwise).
    let new_cursor = Cursor::Date(end);
    if new_cursor != cursor {
        checkpoints.write(Stream::Weather, new_cursor)?;
    }

    info!(
        processed = stats.processed,
        skipped = stats.skipped,
        failed = stats.failed,
        cursor = %new_cursor,
        "weather window complete"
    );
    Ok(WindowOutcome::Advanced {
        cursor: new_cursor,
        stats,
    })
}

/// Normalize and insert each observation row in source order.
pub(crate) fn consume_window(repo: &CrashRepository, rows: &[WeatherDaily]) -> WindowStats {
    let mut stats = WindowStats::default();
    for raw in rows {
        match normalize_weather_day(raw) {
            Ok(Some(row)) => match repo.insert_weather_day(&row) {
                Ok(true) => {
                    stats.processed += 1;
                }
                Ok(false) => {
                    debug!(date = %row.date, "weather day already stored, ignoring");
                    stats.processed += 1;
                }
                Err(e) => {
                    warn!(date = %row.date, error = %e, "failed to store weather day");
                    stats.failed += 1;
                }
            },
            Ok(None) => {
                debug!(date = %raw.date, "no temperatures reported, skipping day");
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(date = %raw.date, error = %e, "skipping malformed observation");
                stats.skipped += 1;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, tavg: Option<f64>) -> WeatherDaily {
        WeatherDaily {
            date: date.to_string(),
            tavg,
            tmin: tavg.map(|t| t - 5.0),
            tmax: tavg.map(|t| t + 5.0),
        }
    }

    #[test]
    fn test_consume_window_inserts_days() {
        let repo = CrashRepository::in_memory().unwrap();
        let rows = vec![
            day("2020-01-02", Some(0.0)),
            day("2020-01-03", Some(-2.0)),
        ];

        let stats = consume_window(&repo, &rows);
        assert_eq!(stats.processed, 2);
        assert_eq!(repo.counts().unwrap().weather_days, 2);
    }

    #[test]
    fn test_consume_window_is_idempotent() {
        let repo = CrashRepository::in_memory().unwrap();
        let rows = vec![day("2020-01-02", Some(0.0))];

        consume_window(&repo, &rows);
        let rerun = consume_window(&repo, &rows);

        assert_eq!(repo.counts().unwrap().weather_days, 1);
        assert_eq!(rerun.failed, 0);
    }

    #[test]
    fn test_empty_observation_days_are_skipped() {
        let repo = CrashRepository::in_memory().unwrap();
        let rows = vec![day("2020-01-02", Some(1.5)), day("2020-01-03", None)];

        let stats = consume_window(&repo, &rows);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(repo.counts().unwrap().weather_days, 1);
    }

    #[test]
    fn test_malformed_date_is_skipped() {
        let repo = CrashRepository::in_memory().unwrap();
        let rows = vec![day("01/02/2020", Some(1.5))];

        let stats = consume_window(&repo, &rows);
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.skipped, 1);
    }
}
