//! Configuration for the ingestion pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::client::{GeoPoint, CRASH_API_BASE_URL, WEATHER_API_BASE_URL};

/// Database and checkpoint locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,
}

fn default_db_path() -> String {
    "data/proj_data.db".to_string()
}

fn default_checkpoint_dir() -> String {
    "data/checkpoints".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

/// Crash API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashApiConfig {
    #[serde(default = "default_crash_base_url")]
    pub base_url: String,
    /// FARS state code (26 = Michigan)
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(default = "default_from_year")]
    pub from_year: i32,
    #[serde(default = "default_to_year")]
    pub to_year: i32,
    #[serde(default = "default_min_vehicles")]
    pub min_vehicles: u32,
    #[serde(default = "default_max_vehicles")]
    pub max_vehicles: u32,
}

fn default_crash_base_url() -> String {
    CRASH_API_BASE_URL.to_string()
}

fn default_state() -> i64 {
    26
}

fn default_from_year() -> i32 {
    2014
}

fn default_to_year() -> i32 {
    2015
}

fn default_min_vehicles() -> u32 {
    1
}

fn default_max_vehicles() -> u32 {
    6
}

impl Default for CrashApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_crash_base_url(),
            state: default_state(),
            from_year: default_from_year(),
            to_year: default_to_year(),
            min_vehicles: default_min_vehicles(),
            max_vehicles: default_max_vehicles(),
        }
    }
}

/// Weather source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Observation point (defaults to Detroit, MI)
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_altitude")]
    pub altitude: i32,
    /// Last date considered already ingested on first run
    #[serde(default = "default_initial_date")]
    pub initial_date: NaiveDate,
}

fn default_weather_base_url() -> String {
    WEATHER_API_BASE_URL.to_string()
}

fn default_latitude() -> f64 {
    42.3314
}

fn default_longitude() -> f64 {
    -83.0458
}

fn default_altitude() -> i32 {
    183
}

fn default_initial_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid constant date")
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: None,
            latitude: default_latitude(),
            longitude: default_longitude(),
            altitude: default_altitude(),
            initial_date: default_initial_date(),
        }
    }
}

impl WeatherConfig {
    /// The configured observation point.
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
        }
    }
}

/// Windowing configuration shared by all streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records (or days) consumed per invocation
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_batch_size() -> u32 {
    25
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub crash_api: CrashApiConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (FARS_DATABASE_PATH, etc.)
            .add_source(
                config::Environment::with_prefix("FARS")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_backfill() {
        let config = AppConfig::default();
        assert_eq!(config.crash_api.state, 26);
        assert_eq!(config.crash_api.from_year, 2014);
        assert_eq!(config.crash_api.to_year, 2015);
        assert_eq!(config.ingest.batch_size, 25);
        assert_eq!(config.weather.latitude, 42.3314);
        assert_eq!(
            config.weather.initial_date,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }
}
