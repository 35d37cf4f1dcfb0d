//! SQLite schema definitions for crash and weather data
//!
//! Tables:
//! - crashes: One row per FARS case, keyed naturally by st_case
//! - counties: County dimension (surrogate key, unique name)
//! - crash_details: One-to-one detail attributes, keyed by crashes.id
//! - intersection_types: Intersection-type dimension
//! - daily_data_meteostat: One row per calendar day of weather observations

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    // Core crash records. Duplicate case numbers are ignored at insert
    // time, never overwritten.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS crashes (
            id INTEGER PRIMARY KEY,
            county_id INTEGER NOT NULL REFERENCES counties(county_id),
            crash_date TEXT NOT NULL,
            fatals INTEGER NOT NULL,
            peds INTEGER NOT NULL,
            persons INTEGER NOT NULL,
            st_case INTEGER NOT NULL UNIQUE,
            state INTEGER NOT NULL,
            total_vehicles INTEGER NOT NULL
        )
        "#,
        [],
    )?;

    // County dimension, populated lazily on first sight of a name
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS counties (
            county_id INTEGER PRIMARY KEY,
            county_name TEXT NOT NULL UNIQUE
        )
        "#,
        [],
    )?;

    // Intersection-type dimension
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS intersection_types (
            type_id INTEGER PRIMARY KEY,
            type_name TEXT NOT NULL UNIQUE
        )
        "#,
        [],
    )?;

    // Per-case detail attributes, absent until the details pass reaches
    // the case (and permanently absent when upstream has no record)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS crash_details (
            id INTEGER PRIMARY KEY REFERENCES crashes(id),
            drunk INTEGER NOT NULL,
            weekday INTEGER NOT NULL,
            type_id INTEGER NOT NULL REFERENCES intersection_types(type_id)
        )
        "#,
        [],
    )?;

    // Daily weather observations, joined to crashes by date at query time
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS daily_data_meteostat (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL UNIQUE,
            temperature_avg REAL,
            temperature_min REAL,
            temperature_max REAL
        )
        "#,
        [],
    )?;

    Ok(())
}
