//! Client for the NHTSA FARS Crash API.
//!
//! The case-list endpoint returns the entire matching set for a query in
//! one response; windowing over it happens locally in the driver. The
//! case-details endpoint is queried per case and may legitimately report
//! "not found".

use crate::client::{case_details_url, case_list_url};
use crate::error::{IngestError, Result};
use crate::types::{CaseDetailsResponse, CaseListEntry, CaseListResponse, CrashResultSet};

/// Query parameters for one case-list request.
#[derive(Debug, Clone)]
pub struct CaseListQuery {
    pub state: i64,
    pub from_year: i32,
    pub to_year: i32,
    pub min_vehicles: u32,
    pub max_vehicles: u32,
}

/// Build the query pairs for a case-list request.
fn case_list_params(query: &CaseListQuery) -> [(&'static str, String); 6] {
    [
        ("states", query.state.to_string()),
        ("fromYear", query.from_year.to_string()),
        ("toYear", query.to_year.to_string()),
        ("minNumOfVehicles", query.min_vehicles.to_string()),
        ("maxNumOfVehicles", query.max_vehicles.to_string()),
        ("format", "json".to_string()),
    ]
}

/// Build the query pairs for a case-details request.
fn case_details_params(st_case: i64, case_year: &str, state: i64) -> [(&'static str, String); 4] {
    [
        ("stateCase", st_case.to_string()),
        ("caseYear", case_year.to_string()),
        ("state", state.to_string()),
        ("format", "json".to_string()),
    ]
}

/// HTTP client for the Crash API.
pub struct CrashApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl CrashApiClient {
    /// Create a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch the full case list for a query. The response is the entire
    /// matching set; callers slice their own window out of it.
    pub async fn fetch_case_list(&self, query: &CaseListQuery) -> Result<Vec<CaseListEntry>> {
        let url = case_list_url(&self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&case_list_params(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::SourceUnavailable(format!(
                "case list returned {}",
                status
            )));
        }

        let body: CaseListResponse = response.json().await?;
        Ok(body.cases().to_vec())
    }

    /// Fetch detail attributes for one case. Returns `Ok(None)` when the
    /// case is unknown upstream (`Results[0][0]` absent) — that is a skip,
    /// not an error.
    pub async fn fetch_case_details(
        &self,
        st_case: i64,
        case_year: &str,
        state: i64,
    ) -> Result<Option<CrashResultSet>> {
        let url = case_details_url(&self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&case_details_params(st_case, case_year, state))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::SourceUnavailable(format!(
                "case details returned {}",
                status
            )));
        }

        let body: CaseDetailsResponse = response.json().await?;
        Ok(body.entry().map(|e| e.crash_result_set.clone()))
    }
}
