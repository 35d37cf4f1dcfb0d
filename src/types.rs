//! Raw payload types for the FARS Crash API and the Meteostat daily API.
//!
//! These mirror the wire format only; normalization into database rows
//! happens in `normalize`.

use serde::{Deserialize, Deserializer};

/// Response envelope for `crashes/GetCaseList`.
///
/// The API nests the case objects one level deep: `Results[0]` holds the
/// full matching list for the query.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseListResponse {
    #[serde(rename = "Results", default)]
    pub results: Vec<Vec<CaseListEntry>>,
}

impl CaseListResponse {
    /// The full case list reported by the API, or an empty slice when the
    /// envelope carried no inner list.
    pub fn cases(&self) -> &[CaseListEntry] {
        self.results.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One case from the case-list response.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseListEntry {
    #[serde(rename = "CountyName")]
    pub county_name: String,
    /// Fixed-width encoded timestamp, e.g. `/Date(1388552400000-0500)/`.
    #[serde(rename = "CrashDate")]
    pub crash_date: String,
    #[serde(rename = "Fatals", deserialize_with = "flexible_i64")]
    pub fatals: i64,
    #[serde(rename = "Peds", deserialize_with = "flexible_i64")]
    pub peds: i64,
    #[serde(rename = "Persons", deserialize_with = "flexible_i64")]
    pub persons: i64,
    #[serde(rename = "St_Case", deserialize_with = "flexible_i64")]
    pub st_case: i64,
    #[serde(rename = "State", deserialize_with = "flexible_i64")]
    pub state: i64,
    #[serde(rename = "StateName", default)]
    pub state_name: String,
    #[serde(rename = "TotalVehicles", deserialize_with = "flexible_i64")]
    pub total_vehicles: i64,
}

/// Response envelope for `crashes/GetCaseDetails`.
///
/// `Results[0][0]` is absent when the case is unknown upstream; callers
/// treat that as "not found", never as an error.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseDetailsResponse {
    #[serde(rename = "Results", default)]
    pub results: Vec<Vec<CaseDetailsEntry>>,
}

impl CaseDetailsResponse {
    /// The single detail entry, if the case exists upstream.
    pub fn entry(&self) -> Option<&CaseDetailsEntry> {
        self.results.first().and_then(|inner| inner.first())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseDetailsEntry {
    #[serde(rename = "CrashResultSet")]
    pub crash_result_set: CrashResultSet,
}

/// Detail attributes for one case. The API serializes numbers as strings
/// here, so the numeric fields parse either representation.
#[derive(Debug, Clone, Deserialize)]
pub struct CrashResultSet {
    #[serde(rename = "DRUNK_DR", deserialize_with = "flexible_i64")]
    pub drunk_dr: i64,
    #[serde(rename = "TYP_INTNAME")]
    pub typ_intname: String,
    /// 1 = Sunday .. 7 = Saturday.
    #[serde(rename = "DAY_WEEK", deserialize_with = "flexible_i64")]
    pub day_week: i64,
}

/// Response envelope for the Meteostat `point/daily` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub data: Vec<WeatherDaily>,
}

/// One daily observation row, temperatures in Celsius. Stations report
/// gaps, so every temperature is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherDaily {
    pub date: String,
    pub tavg: Option<f64>,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
}

/// Accept an integer encoded either as a JSON number or a JSON string.
fn flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(i64),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_list_nested_results() {
        let json = r#"{
            "Results": [[
                {
                    "CountyName": "WAYNE (163)",
                    "CrashDate": "/Date(1388552400000-0500)/",
                    "Fatals": 1,
                    "Peds": 0,
                    "Persons": 2,
                    "St_Case": 260001,
                    "State": 26,
                    "StateName": "Michigan",
                    "TotalVehicles": 1
                }
            ]]
        }"#;

        let resp: CaseListResponse = serde_json::from_str(json).unwrap();
        let cases = resp.cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].st_case, 260001);
        assert_eq!(cases[0].county_name, "WAYNE (163)");
    }

    #[test]
    fn test_case_list_empty_results() {
        let resp: CaseListResponse = serde_json::from_str(r#"{"Results": []}"#).unwrap();
        assert!(resp.cases().is_empty());
    }

    #[test]
    fn test_case_details_stringly_numbers() {
        let json = r#"{
            "Results": [[
                {
                    "CrashResultSet": {
                        "DRUNK_DR": "1",
                        "TYP_INTNAME": "Not an Intersection",
                        "DAY_WEEK": "4"
                    }
                }
            ]]
        }"#;

        let resp: CaseDetailsResponse = serde_json::from_str(json).unwrap();
        let entry = resp.entry().unwrap();
        assert_eq!(entry.crash_result_set.drunk_dr, 1);
        assert_eq!(entry.crash_result_set.day_week, 4);
    }

    #[test]
    fn test_case_details_not_found() {
        let resp: CaseDetailsResponse = serde_json::from_str(r#"{"Results": [[]]}"#).unwrap();
        assert!(resp.entry().is_none());
    }

    #[test]
    fn test_weather_nullable_temperatures() {
        let json = r#"{"data": [{"date": "2020-01-01", "tavg": null, "tmin": -3.1, "tmax": 2.0}]}"#;
        let resp: WeatherResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert!(resp.data[0].tavg.is_none());
        assert_eq!(resp.data[0].tmin, Some(-3.1));
    }
}
