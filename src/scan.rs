//! Image directory scanning, dating and renaming.
//!
//! Stage 1 of a run. Lists the images directory, keeps supported images,
//! derives a year for each one and renames images whose filename carries no
//! `YYYY-MM` prefix so their date survives future runs.
//!
//! ## Directory Structure
//!
//! ```text
//! images/
//! ├── 2020-01.png            # Dated: grouped under 2020
//! ├── 2020-05.jpg
//! ├── 2021-07_0.png          # Dated, collision suffix
//! ├── vacation.png           # Undated: renamed to e.g. 2022-03.png
//! ├── _ignore-banner.png     # Ignore prefix: skipped
//! └── notes.txt              # Not an image: skipped
//! ```
//!
//! ## Two Phases
//!
//! Renames are planned before anything touches the disk. [`plan`] reads the
//! listing and timestamps and decides every new name up front, so the outcome
//! never depends on the order in which files get renamed. [`apply_rename`]
//! then performs one rename at a time. A failed rename aborts the run and
//! leaves earlier renames in place.
//!
//! ## Naming Collisions
//!
//! An undated image made in March 2022 becomes `2022-03.<ext>`. If any image
//! (of any supported extension) already uses that stem, or an earlier planned
//! rename claimed it, the suffix counter kicks in: `2022-03_0`, `2022-03_1`,
//! and so on without an upper bound.
//!
//! ## Ordering
//!
//! Images are reported sorted by their final filename. Sorting by the name
//! after renaming keeps the output of a renaming run identical to the output
//! of the next run, which has nothing left to rename.

use crate::config::{Config, GroupOrder};
use crate::naming::{format_stem, parse_dated_name, split_extension};
use crate::timestamps::TimestampSource;
use chrono::Datelike;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory listing error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Images directory not found: {0}")]
    MissingDirectory(PathBuf),
    #[error("Failed to read timestamp of {path}: {source}")]
    Timestamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Refusing to rename {from} to {to}: target already exists")]
    TargetExists { from: PathBuf, to: PathBuf },
    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A planned or applied rename inside the images directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// An image with its final (post-rename) filename and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedImage {
    pub filename: String,
    pub year: String,
}

/// Images of one calendar year, in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearGroup {
    pub year: String,
    pub images: Vec<String>,
}

/// Year groups in the order each year was first encountered.
///
/// Every group holds at least one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct YearGroups {
    groups: Vec<YearGroup>,
}

impl YearGroups {
    /// Append `image` to the group for `year`, creating the group if needed.
    pub fn insert(&mut self, year: &str, image: String) {
        match self.groups.iter_mut().find(|g| g.year == year) {
            Some(group) => group.images.push(image),
            None => self.groups.push(YearGroup {
                year: year.to_string(),
                images: vec![image],
            }),
        }
    }

    pub fn get(&self, year: &str) -> Option<&YearGroup> {
        self.groups.iter().find(|g| g.year == year)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &YearGroup> {
        self.groups.iter()
    }

    /// Groups in the requested display order.
    pub fn ordered(&self, order: GroupOrder) -> Vec<&YearGroup> {
        let mut groups: Vec<&YearGroup> = self.groups.iter().collect();
        if order == GroupOrder::NewestFirst {
            // Years are four ASCII digits, so text order is numeric order.
            groups.sort_by(|a, b| b.year.cmp(&a.year));
        }
        groups
    }
}

/// Result of the scan stage: every image, grouped by year.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageSet {
    /// Final filenames in scan order.
    pub images: Vec<String>,
    pub groups: YearGroups,
    /// Renames performed to produce the final filenames.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<Rename>,
}

impl ImageSet {
    /// Total number of images across all groups.
    pub fn total(&self) -> usize {
        self.images.len()
    }
}

/// Rename decisions and the resulting image list, before any rename happens.
#[derive(Debug, Clone, Default)]
pub struct ScanPlan {
    /// Images sorted by final filename.
    pub images: Vec<PlannedImage>,
    /// Renames in the order they should be applied.
    pub renames: Vec<Rename>,
}

impl ScanPlan {
    /// Group the planned images by year.
    pub fn into_image_set(self) -> ImageSet {
        let mut groups = YearGroups::default();
        let mut images = Vec::with_capacity(self.images.len());
        for image in self.images {
            groups.insert(&image.year, image.filename.clone());
            images.push(image.filename);
        }
        ImageSet {
            images,
            groups,
            renames: self.renames,
        }
    }
}

/// Scan `dir`, rename undated images and group everything by year.
pub fn scan(
    dir: &Path,
    config: &Config,
    timestamps: &dyn TimestampSource,
) -> Result<ImageSet, ScanError> {
    let plan = plan(dir, config, timestamps)?;
    for rename in &plan.renames {
        apply_rename(dir, rename)?;
    }
    Ok(plan.into_image_set())
}

/// Decide the final name and year of every image in `dir` without renaming.
pub fn plan(
    dir: &Path,
    config: &Config,
    timestamps: &dyn TimestampSource,
) -> Result<ScanPlan, ScanError> {
    let names = list_files(dir)?;
    plan_renames(dir, &names, config, timestamps)
}

/// List the names of regular files directly inside `dir`, sorted.
///
/// Symlinks count when they resolve to a regular file; dangling ones are
/// skipped. Names that are not valid UTF-8 cannot be referenced from markdown
/// and are left out.
pub fn list_files(dir: &Path) -> Result<Vec<String>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::MissingDirectory(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Whether `name` has a supported image extension.
pub fn is_image(name: &str, config: &Config) -> bool {
    matches!(split_extension(name), (_, Some(ext)) if config.is_supported_extension(ext))
}

/// Whether `name` is excluded by the ignore prefix policy.
pub fn is_ignored(name: &str, config: &Config) -> bool {
    config.exclude_ignore_prefix && name.starts_with(&config.ignore_prefix)
}

/// Plan renames for a directory listing.
///
/// `names` is the full listing of `dir`; timestamps are only read for images
/// that need a new name.
pub fn plan_renames(
    dir: &Path,
    names: &[String],
    config: &Config,
    timestamps: &dyn TimestampSource,
) -> Result<ScanPlan, ScanError> {
    // Stems of every image on disk, ignored ones included: a rename must not
    // shadow any of them.
    let mut taken: HashSet<String> = names
        .iter()
        .filter(|n| is_image(n, config))
        .map(|n| split_extension(n).0.to_string())
        .collect();

    let mut sorted: Vec<&String> = names
        .iter()
        .filter(|n| is_image(n, config) && !is_ignored(n, config))
        .collect();
    sorted.sort();

    let mut images = Vec::with_capacity(sorted.len());
    let mut renames = Vec::new();

    for name in sorted {
        let (stem, ext) = split_extension(name);
        if let Some(dated) = parse_dated_name(stem) {
            images.push(PlannedImage {
                filename: name.clone(),
                year: dated.year,
            });
            continue;
        }

        let path = dir.join(name);
        let ts = timestamps
            .timestamp(&path)
            .map_err(|source| ScanError::Timestamp {
                path: path.clone(),
                source,
            })?;
        let new_stem = free_stem(ts.year(), ts.month(), &taken);
        taken.insert(new_stem.clone());

        let new_name = match ext {
            Some(ext) => format!("{new_stem}.{ext}"),
            None => new_stem.clone(),
        };
        renames.push(Rename {
            from: name.clone(),
            to: new_name.clone(),
        });
        images.push(PlannedImage {
            filename: new_name,
            year: format!("{:04}", ts.year()),
        });
    }

    images.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(ScanPlan { images, renames })
}

/// First `YYYY-MM` / `YYYY-MM_N` stem not present in `taken`.
fn free_stem(year: i32, month: u32, taken: &HashSet<String>) -> String {
    let base = format_stem(year, month, None);
    if !taken.contains(&base) {
        return base;
    }
    let mut suffix = 0u32;
    loop {
        let candidate = format_stem(year, month, Some(suffix));
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Rename one image inside `dir`.
///
/// Refuses to overwrite an existing file.
pub fn apply_rename(dir: &Path, rename: &Rename) -> Result<(), ScanError> {
    let from = dir.join(&rename.from);
    let to = dir.join(&rename.to);
    if to.exists() {
        return Err(ScanError::TargetExists { from, to });
    }
    fs::rename(&from, &to).map_err(|source| ScanError::Rename { from, to, source })
}
