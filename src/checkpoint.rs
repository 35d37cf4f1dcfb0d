//! Durable progress markers for each ingestion stream.
//!
//! One cursor file per stream under a configurable directory. Writes go
//! through a temp file and an atomic rename so a crash mid-write never
//! leaves the store unreadable. Single-writer by design; nothing here
//! guards against two concurrent invocations of the same stream.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The ingestion streams that keep independent checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    CrashList,
    CrashDetails,
    Weather,
}

impl Stream {
    /// File name of this stream's cursor inside the checkpoint directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Stream::CrashList => "crash_list.cursor",
            Stream::CrashDetails => "crash_details.cursor",
            Stream::Weather => "weather.cursor",
        }
    }
}

/// Progress marker: an ordinal offset into an API result list, or the last
/// calendar date already ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cursor {
    Offset(u64),
    Date(NaiveDate),
}

impl Cursor {
    /// Advance the cursor by `by` records (offset) or `by` days (date).
    pub fn advance(self, by: u64) -> Cursor {
        match self {
            Cursor::Offset(n) => Cursor::Offset(n + by),
            Cursor::Date(d) => Cursor::Date(d.checked_add_days(Days::new(by)).unwrap_or(d)),
        }
    }

    pub fn as_offset(&self) -> Option<u64> {
        match self {
            Cursor::Offset(n) => Some(*n),
            Cursor::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cursor::Offset(_) => None,
            Cursor::Date(d) => Some(*d),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Offset(n) => write!(f, "{}", n),
            Cursor::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for Cursor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains('-') {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date cursor: {:?}", s))?;
            Ok(Cursor::Date(date))
        } else {
            let offset = s
                .parse::<u64>()
                .with_context(|| format!("invalid offset cursor: {:?}", s))?;
            Ok(Cursor::Offset(offset))
        }
    }
}

/// File-backed checkpoint store, one file per stream.
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, stream: Stream) -> PathBuf {
        self.dir.join(stream.file_name())
    }

    /// Read the stream's cursor, or `None` on first run.
    pub fn read(&self, stream: Stream) -> Result<Option<Cursor>> {
        let path = self.path(stream);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
        let cursor = content.parse::<Cursor>()?;
        Ok(Some(cursor))
    }

    /// Read the stream's cursor, falling back to the stream's initial value.
    pub fn read_or(&self, stream: Stream, initial: Cursor) -> Result<Cursor> {
        Ok(self.read(stream)?.unwrap_or(initial))
    }

    /// Durably replace the stream's cursor.
    ///
    /// Written to a sibling temp file first and renamed into place, so the
    /// prior value stays readable until the new one fully exists.
    pub fn write(&self, stream: Stream, cursor: Cursor) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let path = self.path(stream);
        let tmp = path.with_extension("cursor.tmp");
        std::fs::write(&tmp, cursor.to_string())
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}
