//! Normalization of raw API payloads into database rows.
//!
//! Dimension names are resolved to surrogate keys here, before the caller
//! writes the referencing row, so the dimension row always exists first.
//! Malformed payloads come back as `MalformedPayload`; the drivers log
//! those and skip the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{IngestError, Result};
use crate::storage::repository::{CrashRow, DetailRow, WeatherDayRow};
use crate::storage::CrashRepository;
use crate::types::{CaseListEntry, CrashResultSet, WeatherDaily};

/// Decode the API's fixed-width `/Date(…)/` representation: digits 6..16
/// hold a Unix epoch value in seconds (the trailing digits are dropped
/// milliseconds).
pub fn decode_crash_date(raw: &str) -> Result<NaiveDateTime> {
    let digits = raw.get(6..16).ok_or_else(|| {
        IngestError::MalformedPayload(format!("crash date too short: {:?}", raw))
    })?;
    let epoch = digits.parse::<i64>().map_err(|_| {
        IngestError::MalformedPayload(format!("crash date not numeric: {:?}", raw))
    })?;
    let ts = DateTime::from_timestamp(epoch, 0).ok_or_else(|| {
        IngestError::MalformedPayload(format!("crash date out of range: {}", epoch))
    })?;
    Ok(ts.naive_utc())
}

/// Convert Celsius to Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Normalize one case-list entry into a crash row, resolving the county
/// name to its surrogate key.
pub fn normalize_crash(repo: &CrashRepository, raw: &CaseListEntry) -> Result<CrashRow> {
    let crash_date = decode_crash_date(&raw.crash_date)?;
    let county_id = repo.resolve_county(&raw.county_name)?;

    Ok(CrashRow {
        county_id,
        crash_date,
        fatals: raw.fatals,
        peds: raw.peds,
        persons: raw.persons,
        st_case: raw.st_case,
        state: raw.state,
        total_vehicles: raw.total_vehicles,
    })
}

/// Normalize one case-detail result set into a detail row for the given
/// crash id, resolving the intersection-type name.
pub fn normalize_detail(
    repo: &CrashRepository,
    crash_id: i64,
    raw: &CrashResultSet,
) -> Result<DetailRow> {
    if !(1..=7).contains(&raw.day_week) {
        return Err(IngestError::MalformedPayload(format!(
            "weekday code out of range: {}",
            raw.day_week
        )));
    }
    let type_id = repo.resolve_intersection_type(&raw.typ_intname)?;

    Ok(DetailRow {
        crash_id,
        drunk: raw.drunk_dr,
        weekday: raw.day_week,
        type_id,
    })
}

/// Normalize one daily weather observation, converting temperatures to
/// Fahrenheit. Returns `None` (skip) when the station reported no
/// temperatures at all for the day.
pub fn normalize_weather_day(raw: &WeatherDaily) -> Result<Option<WeatherDayRow>> {
    let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|_| {
        IngestError::MalformedPayload(format!("weather date: {:?}", raw.date))
    })?;

    if raw.tavg.is_none() && raw.tmin.is_none() && raw.tmax.is_none() {
        return Ok(None);
    }

    Ok(Some(WeatherDayRow {
        date,
        temperature_avg: raw.tavg.map(celsius_to_fahrenheit),
        temperature_min: raw.tmin.map(celsius_to_fahrenheit),
        temperature_max: raw.tmax.map(celsius_to_fahrenheit),
    }))
}
