//! # readme-gallery
//!
//! Keeps a README's screenshot gallery in sync with an `images/` directory.
//! Images are grouped by year, undated images are renamed after the month
//! they were made, and a marked region of the README is regenerated with one
//! preview per year plus a per-year side document holding the full table.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan    images/    →  ImageSet        (renames undated files)
//! 2. Patch   README.md  →  README.md + images_<year>.md
//! ```
//!
//! The document is read and its markers validated before the scan, so a
//! broken README never leaves the images directory half-renamed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: lists and dates images, renames the undated ones, groups by year |
//! | [`patch`] | Stage 2: markers, summaries and side documents |
//! | [`pipeline`] | Runs the stages over a project root: build, check, scan |
//! | [`config`] | `readme-gallery.toml` loading, merging and validation |
//! | [`naming`] | `YYYY-MM` filename convention |
//! | [`timestamps`] | Filesystem timestamp source for undated images |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Filename Is the Database
//!
//! An image's year comes from its name. Files without a `YYYY-MM` prefix are
//! dated once from filesystem metadata and renamed, after which metadata no
//! longer matters: copying the repository, which resets timestamps, cannot
//! move an image to another year.
//!
//! ## Plan, Then Rename
//!
//! All new names are decided before the first rename so collision handling
//! never depends on directory iteration order.
//!
//! ## Idempotent Output
//!
//! Images are ordered by their final filename and every generated line ends
//! before the end marker, so running the tool on an unchanged directory
//! rewrites the README byte for byte.

pub mod config;
pub mod naming;
pub mod output;
pub mod patch;
pub mod pipeline;
pub mod scan;
pub mod timestamps;

#[cfg(test)]
pub(crate) mod test_helpers;
