//! Shared test utilities for the readme-gallery test suite.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! touch(&tmp.path().join("images"), "vacation.png");
//! let timestamps = FixedTimestamps::default().with("vacation.png", 2022, 3);
//! ```

use crate::timestamps::TimestampSource;
use chrono::{DateTime, Local, TimeZone};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// Tests get an isolated copy they can rename and rewrite freely.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Create a placeholder image. Nothing ever decodes it.
pub fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), "fake image").unwrap();
}

/// Sorted names of the regular files in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Contents of every markdown file in the project root, keyed by name.
pub fn snapshot_outputs(root: &Path) -> BTreeMap<String, String> {
    file_names(root)
        .into_iter()
        .filter(|name| name.ends_with(".md"))
        .map(|name| {
            let contents = std::fs::read_to_string(root.join(&name)).unwrap();
            (name, contents)
        })
        .collect()
}

// =========================================================================
// Timestamps
// =========================================================================

/// Timestamps keyed by file name; unknown files report `NotFound`.
#[derive(Debug, Default)]
pub struct FixedTimestamps {
    dates: HashMap<String, DateTime<Local>>,
}

impl FixedTimestamps {
    /// Date `name` to the middle of the given month.
    pub fn with(mut self, name: &str, year: i32, month: u32) -> Self {
        let date = Local
            .with_ymd_and_hms(year, month, 15, 12, 0, 0)
            .single()
            .unwrap();
        self.dates.insert(name.to_string(), date);
        self
    }
}

impl TimestampSource for FixedTimestamps {
    fn timestamp(&self, path: &Path) -> io::Result<DateTime<Local>> {
        path.file_name()
            .and_then(|n| self.dates.get(&*n.to_string_lossy()))
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no fixed timestamp"))
    }
}
