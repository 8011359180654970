//! Filesystem timestamps for dating images that carry no `YYYY-MM` prefix.
//!
//! The scan stage only needs "which month was this file made in", so the
//! seam is a single trait. Production code reads file metadata through
//! [`FsTimestamps`]; tests substitute fixed dates.

use crate::config::TimestampKind;
use chrono::{DateTime, Local};
use std::io;
use std::path::Path;

/// Source of the timestamp used to date an image file.
pub trait TimestampSource {
    /// Local time associated with the file at `path`.
    fn timestamp(&self, path: &Path) -> io::Result<DateTime<Local>>;
}

/// Reads timestamps from filesystem metadata.
#[derive(Debug, Clone, Copy)]
pub struct FsTimestamps {
    kind: TimestampKind,
}

impl FsTimestamps {
    pub fn new(kind: TimestampKind) -> Self {
        Self { kind }
    }
}

impl TimestampSource for FsTimestamps {
    fn timestamp(&self, path: &Path) -> io::Result<DateTime<Local>> {
        let metadata = std::fs::metadata(path)?;
        let time = match self.kind {
            // Not every platform/filesystem records birth time.
            TimestampKind::Created => metadata.created().or_else(|_| metadata.modified())?,
            TimestampKind::Modified => metadata.modified()?,
        };
        Ok(DateTime::<Local>::from(time))
    }
}
