//! Client for the Meteostat point/daily endpoint.
//!
//! Queried by geographic point and explicit date range; the server does
//! the windowing here, unlike the crash list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::client::point_daily_url;
use crate::error::{IngestError, Result};
use crate::types::{WeatherDaily, WeatherResponse};

/// Geographic point an observation series is anchored to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters.
    pub altitude: i32,
}

/// Build the query pairs for a daily-weather request.
fn point_daily_params(
    point: &GeoPoint,
    start: NaiveDate,
    end: NaiveDate,
) -> [(&'static str, String); 5] {
    [
        ("lat", point.latitude.to_string()),
        ("lon", point.longitude.to_string()),
        ("alt", point.altitude.to_string()),
        ("start", start.format("%Y-%m-%d").to_string()),
        ("end", end.format("%Y-%m-%d").to_string()),
    ]
}

/// HTTP client for the weather source.
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    /// Create a client against the given base URL, with an optional API
    /// key sent as the `x-rapidapi-key` header.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Fetch one daily observation row per calendar day in the inclusive
    /// date range. Days the station has no record for are simply absent.
    pub async fn fetch_daily(
        &self,
        point: &GeoPoint,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherDaily>> {
        let url = point_daily_url(&self.base_url);
        let mut request = self
            .http
            .get(&url)
            .query(&point_daily_params(point, start, end));
        if let Some(ref key) = self.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::SourceUnavailable(format!(
                "weather source returned {}",
                status
            )));
        }

        let body: WeatherResponse = response.json().await?;
        Ok(body.data)
    }
}
