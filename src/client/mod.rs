//! HTTP clients for the external data sources.
//!
//! One client per source:
//! - FARS Crash API (case list + case details), JSON over GET
//! - Meteostat point/daily endpoint, JSON over GET
//!
//! Transport failures and non-success statuses map to
//! `IngestError::SourceUnavailable`; a non-success response is never
//! treated as an empty result.

pub mod crash_api;
pub mod weather;

pub use crash_api::{CaseListQuery, CrashApiClient};
pub use weather::{GeoPoint, WeatherClient};

/// Default base URL for the NHTSA Crash API
pub const CRASH_API_BASE_URL: &str = "https://crashviewer.nhtsa.dot.gov/CrashAPI";

/// Default base URL for the Meteostat JSON API
pub const WEATHER_API_BASE_URL: &str = "https://meteostat.p.rapidapi.com";

/// Build the case-list endpoint URL
pub fn case_list_url(base_url: &str) -> String {
    format!("{}/crashes/GetCaseList", base_url)
}

/// Build the case-details endpoint URL
pub fn case_details_url(base_url: &str) -> String {
    format!("{}/crashes/GetCaseDetails", base_url)
}

/// Build the daily-weather endpoint URL
pub fn point_daily_url(base_url: &str) -> String {
    format!("{}/point/daily", base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_list_url() {
        assert_eq!(
            case_list_url(CRASH_API_BASE_URL),
            "https://crashviewer.nhtsa.dot.gov/CrashAPI/crashes/GetCaseList"
        );
    }

    #[test]
    fn test_case_details_url() {
        assert_eq!(
            case_details_url(CRASH_API_BASE_URL),
            "https://crashviewer.nhtsa.dot.gov/CrashAPI/crashes/GetCaseDetails"
        );
    }

    #[test]
    fn test_point_daily_url() {
        assert_eq!(
            point_daily_url(WEATHER_API_BASE_URL),
            "https://meteostat.p.rapidapi.com/point/daily"
        );
    }
}
