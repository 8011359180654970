//! CLI output formatting.
//!
//! Output is information-first: years and images are listed by what they
//! are, with file paths as indented context.
//!
//! ```text
//! Renaming vacation.png to 2022-03.png
//!
//! Years
//! 2022 (1 image)
//!     001 2022-03.png
//! 2021 (1 image)
//!     001 2021-07.png
//! 2020 (2 images)
//!     001 2020-01.png
//!     002 2020-05.jpg
//!
//! Wrote images_2022.md
//! Wrote images_2021.md
//! Wrote images_2020.md
//! Wrote README.md (4 images)
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write to stdout.

use crate::config::GroupOrder;
use crate::pipeline::{BuildReport, CheckReport};
use crate::scan::{ImageSet, Rename};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn count_label(count: usize) -> String {
    if count == 1 {
        "1 image".to_string()
    } else {
        format!("{count} images")
    }
}

/// Display a written path relative to the project root when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

pub fn format_rename(rename: &Rename) -> String {
    format!("Renaming {} to {}", rename.from, rename.to)
}

/// Print a rename as it is about to happen.
pub fn print_rename(rename: &Rename) {
    println!("{}", format_rename(rename));
}

/// Format the year groups with their images.
pub fn format_image_set(images: &ImageSet, order: GroupOrder) -> Vec<String> {
    let mut lines = vec!["Years".to_string()];
    if images.groups.is_empty() {
        lines.push(format!("{}(no images)", indent(1)));
        return lines;
    }
    for group in images.groups.ordered(order) {
        lines.push(format!("{} ({})", group.year, count_label(group.images.len())));
        for (i, image) in group.images.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(i + 1), image));
        }
    }
    lines
}

pub fn print_image_set(images: &ImageSet, order: GroupOrder) {
    for line in format_image_set(images, order) {
        println!("{}", line);
    }
}

/// Format the files written by a build.
///
/// The document comes last and carries the total image count.
pub fn format_build_output(report: &BuildReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let total = report.images.total();
    let count = report.written.len();
    for (i, path) in report.written.iter().enumerate() {
        let shown = display_path(path, root);
        if i + 1 == count {
            lines.push(format!("Wrote {} ({})", shown, count_label(total)));
        } else {
            lines.push(format!("Wrote {}", shown));
        }
    }
    lines
}

pub fn print_build_output(report: &BuildReport, root: &Path) {
    for line in format_build_output(report, root) {
        println!("{}", line);
    }
}

/// Format the outcome of a dry run.
pub fn format_check_output(report: &CheckReport, order: GroupOrder) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.plan.renames.is_empty() {
        lines.push("Pending renames".to_string());
        for rename in &report.plan.renames {
            lines.push(format!("{}{} \u{2192} {}", indent(1), rename.from, rename.to));
        }
        lines.push(String::new());
    }

    lines.extend(format_image_set(&report.images, order));
    lines.push(String::new());

    if report.document_stale {
        lines.push("Document: out of date".to_string());
    } else {
        lines.push("Document: up to date".to_string());
    }
    for name in &report.stale_side_documents {
        lines.push(format!("{}{} out of date", indent(1), name));
    }
    lines
}

pub fn print_check_output(report: &CheckReport, order: GroupOrder) {
    for line in format_check_output(report, order) {
        println!("{}", line);
    }
}
