//! Error taxonomy for the ingestion pipeline.
//!
//! Only `SourceUnavailable` aborts an invocation; everything else is isolated
//! to the record that caused it and logged by the driver.

use thiserror::Error;

/// Errors raised while fetching, normalizing, or persisting records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport or HTTP-status failure talking to an external source.
    /// Aborts the current invocation with the checkpoint unchanged.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Upstream payload did not have the expected shape. The record is
    /// skipped and the batch continues.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Store-level failure other than a duplicate-key conflict (those are
    /// absorbed by INSERT OR IGNORE and never reach callers).
    #[error("persistence failure")]
    Persistence(#[from] rusqlite::Error),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::SourceUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
