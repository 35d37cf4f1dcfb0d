//! Ingestion drivers, one per stream.
//!
//! Each invocation consumes exactly one window: read the stream's cursor,
//! fetch, normalize and write every record in source order, then persist
//! the advanced cursor. Per-record failures are logged and skipped; only
//! a source failure aborts an invocation, leaving the cursor untouched.

pub mod crashes;
pub mod details;
pub mod weather;

use crate::checkpoint::Cursor;

/// Per-window record accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Records written, or already present (idempotent no-ops).
    pub processed: usize,
    /// Records skipped: malformed payloads and upstream not-founds.
    pub skipped: usize,
    /// Records that hit a store-level failure.
    pub failed: usize,
}

/// Result of one driver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// A full window was consumed; more data remains.
    Advanced { cursor: Cursor, stats: WindowStats },
    /// The source had fewer records than one full window. The cursor never
    /// moves past the actual data end.
    Exhausted { cursor: Cursor, stats: WindowStats },
}

impl WindowOutcome {
    pub fn cursor(&self) -> Cursor {
        match self {
            WindowOutcome::Advanced { cursor, .. } => *cursor,
            WindowOutcome::Exhausted { cursor, .. } => *cursor,
        }
    }

    pub fn stats(&self) -> WindowStats {
        match self {
            WindowOutcome::Advanced { stats, .. } => *stats,
            WindowOutcome::Exhausted { stats, .. } => *stats,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, WindowOutcome::Exhausted { .. })
    }
}

/// Slice one window `[offset, offset+batch)` out of a full result list.
///
/// Returns the window and whether the source is exhausted (fewer records
/// remained than one full window). An offset at or past the end yields an
/// empty window.
pub fn slice_window<T>(records: &[T], offset: u64, batch: u32) -> (&[T], bool) {
    let start = (offset as usize).min(records.len());
    let end = (start + batch as usize).min(records.len());
    let window = &records[start..end];
    let exhausted = window.len() < batch as usize;
    (window, exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_full_window() {
        let records: Vec<u32> = (0..30).collect();
        let (window, exhausted) = slice_window(&records, 0, 25);
        assert_eq!(window.len(), 25);
        assert_eq!(window[0], 0);
        assert_eq!(window[24], 24);
        assert!(!exhausted);
    }

    #[test]
    fn test_slice_partial_tail() {
        let records: Vec<u32> = (0..30).collect();
        let (window, exhausted) = slice_window(&records, 25, 25);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0], 25);
        assert!(exhausted);
    }

    #[test]
    fn test_slice_offset_past_end() {
        let records: Vec<u32> = (0..10).collect();
        let (window, exhausted) = slice_window(&records, 50, 25);
        assert!(window.is_empty());
        assert!(exhausted);
    }

    #[test]
    fn test_slice_exact_boundary() {
        let records: Vec<u32> = (0..25).collect();
        let (window, exhausted) = slice_window(&records, 0, 25);
        assert_eq!(window.len(), 25);
        assert!(!exhausted);
    }
}
