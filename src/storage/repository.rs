//! SQLite repository for crash, detail, and weather rows.
//!
//! All inserts go through INSERT OR IGNORE keyed by the table's unique
//! constraint, so re-running a window is a no-op for rows that already
//! exist. Dimension names are resolved to surrogate keys here, and the
//! dimension row is committed before any row that references it.

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::schema::create_tables;
use crate::error::Result;

/// One normalized crash record, ready for insert.
#[derive(Debug, Clone)]
pub struct CrashRow {
    pub county_id: i64,
    pub crash_date: NaiveDateTime,
    pub fatals: i64,
    pub peds: i64,
    pub persons: i64,
    pub st_case: i64,
    pub state: i64,
    pub total_vehicles: i64,
}

/// One normalized crash-detail record, keyed by the crash surrogate id.
#[derive(Debug, Clone)]
pub struct DetailRow {
    pub crash_id: i64,
    pub drunk: i64,
    pub weekday: i64,
    pub type_id: i64,
}

/// One normalized daily weather record, temperatures in Fahrenheit.
#[derive(Debug, Clone)]
pub struct WeatherDayRow {
    pub date: NaiveDate,
    pub temperature_avg: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
}

/// Reference to a stored crash, used by the details pass to look up the
/// upstream case.
#[derive(Debug, Clone)]
pub struct CaseRef {
    pub crash_id: i64,
    pub st_case: i64,
    pub state: i64,
    pub case_year: String,
}

/// Row counts per table, for the status report.
#[derive(Debug, Clone, Default)]
pub struct TableCounts {
    pub crashes: i64,
    pub crash_details: i64,
    pub counties: i64,
    pub intersection_types: i64,
    pub weather_days: i64,
}

/// Repository over the shared SQLite database.
pub struct CrashRepository {
    conn: Connection,
}

impl CrashRepository {
    /// Open the database, initializing the schema if needed.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Dimension Resolution ====================

    /// Resolve a county name to its surrogate key, allocating on first
    /// sight. The unique constraint on the name is the source of truth: a
    /// lost insert race falls through to the select and returns the
    /// winner's key.
    pub fn resolve_county(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO counties (county_name) VALUES (?1)",
            [name],
        )?;
        let key = self.conn.query_row(
            "SELECT county_id FROM counties WHERE county_name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(key)
    }

    /// Resolve an intersection-type name to its surrogate key, allocating
    /// on first sight.
    pub fn resolve_intersection_type(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO intersection_types (type_name) VALUES (?1)",
            [name],
        )?;
        let key = self.conn.query_row(
            "SELECT type_id FROM intersection_types WHERE type_name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(key)
    }

    // ==================== Insert Operations ====================

    /// Insert a crash record. Returns false when a row with the same
    /// st_case already exists (the insert is silently ignored).
    pub fn insert_crash(&self, row: &CrashRow) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO crashes
            (county_id, crash_date, fatals, peds, persons, st_case, state, total_vehicles)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                row.county_id,
                row.crash_date.format("%Y-%m-%d %H:%M:%S").to_string(),
                row.fatals,
                row.peds,
                row.persons,
                row.st_case,
                row.state,
                row.total_vehicles,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert a crash detail. Returns false when a detail for the crash id
    /// already exists.
    pub fn insert_crash_detail(&self, row: &DetailRow) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO crash_details (id, drunk, weekday, type_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![row.crash_id, row.drunk, row.weekday, row.type_id],
        )?;
        Ok(changed > 0)
    }

    /// Insert a weather day. Returns false when the date already exists.
    pub fn insert_weather_day(&self, row: &WeatherDayRow) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO daily_data_meteostat
            (date, temperature_avg, temperature_min, temperature_max)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                row.date.format("%Y-%m-%d").to_string(),
                row.temperature_avg,
                row.temperature_min,
                row.temperature_max,
            ],
        )?;
        Ok(changed > 0)
    }

    // ==================== Query Operations ====================

    /// Get up to `limit` stored crashes starting at the given surrogate id,
    /// in id order. Drives the details pass.
    pub fn get_case_refs(&self, start_id: i64, limit: u32) -> Result<Vec<CaseRef>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, st_case, state, substr(crash_date, 1, 4)
            FROM crashes
            WHERE id >= ?1
            ORDER BY id
            LIMIT ?2
            "#,
        )?;

        let refs = stmt
            .query_map(params![start_id, limit], |row| {
                Ok(CaseRef {
                    crash_id: row.get(0)?,
                    st_case: row.get(1)?,
                    state: row.get(2)?,
                    case_year: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(refs)
    }

    /// Fetch a crash by its natural key.
    pub fn get_crash_by_case(&self, st_case: i64) -> Result<Option<(i64, CrashRow)>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, county_id, crash_date, fatals, peds, persons,
                       st_case, state, total_vehicles
                FROM crashes
                WHERE st_case = ?1
                "#,
                [st_case],
                |row| {
                    let date_str: String = row.get(2)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        date_str,
                        CrashRow {
                            county_id: row.get(1)?,
                            crash_date: NaiveDateTime::MIN,
                            fatals: row.get(3)?,
                            peds: row.get(4)?,
                            persons: row.get(5)?,
                            st_case: row.get(6)?,
                            state: row.get(7)?,
                            total_vehicles: row.get(8)?,
                        },
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, date_str, mut crash)) => {
                crash.crash_date =
                    NaiveDateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S")
                        .map_err(|e| {
                            crate::error::IngestError::MalformedPayload(format!(
                                "stored crash_date {:?}: {}",
                                date_str, e
                            ))
                        })?;
                Ok(Some((id, crash)))
            }
            None => Ok(None),
        }
    }

    /// Whether a detail row exists for the given crash id.
    pub fn detail_exists(&self, crash_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crash_details WHERE id = ?1",
            [crash_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Row counts for every table, for the status report.
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<i64> {
            let n = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(n)
        };

        Ok(TableCounts {
            crashes: count("crashes")?,
            crash_details: count("crash_details")?,
            counties: count("counties")?,
            intersection_types: count("intersection_types")?,
            weather_days: count("daily_data_meteostat")?,
        })
    }
}
