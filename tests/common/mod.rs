use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::Path;

pub const README: &str = "\
# Screenshots

<!-- BEGIN IMAGES -->
<!-- END IMAGES -->

We have <!-- BEGIN COUNT -->`0`<!-- END COUNT --> screenshots.
";

/// Config that dates undated images by modification time, which tests can set.
pub const MODIFIED_TIME_CONFIG: &str = "timestamp_source = \"modified\"\n";

/// Lay out a project: README, config and placeholder images.
pub fn write_project(root: &Path, images: &[&str]) {
    fs::write(root.join("README.md"), README).expect("write README");
    fs::write(root.join("readme-gallery.toml"), MODIFIED_TIME_CONFIG).expect("write config");
    let dir = root.join("images");
    fs::create_dir_all(&dir).expect("create images dir");
    for name in images {
        fs::write(dir.join(name), "fake image").expect("write image");
    }
}

/// Set the modification time to noon UTC on the 15th of the month, far enough
/// from month boundaries for any local offset.
pub fn set_month(path: &Path, year: i32, month: u32) {
    let date = chrono::NaiveDate::from_ymd_opt(year, month, 15)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid date");
    let secs = date.and_utc().timestamp();
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).expect("set mtime");
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Sorted file names in a directory.
pub fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
