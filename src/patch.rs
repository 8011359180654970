//! Document patching.
//!
//! Stage 2 of a run. Takes the document's lines and the [`ImageSet`] from the
//! scan stage and produces the new document plus one side document per year.
//! Patching itself is pure; [`write_outputs`] does the I/O.
//!
//! ## Markers
//!
//! ```text
//! # My Project
//!
//! <!-- BEGIN IMAGES -->                      ← kept, generated blocks follow
//! ...anything here is replaced...
//! <!-- END IMAGES -->                        ← kept
//!
//! Screenshots: <!-- BEGIN COUNT -->`17`<!-- END COUNT -->
//!                                   ^^ replaced by the image count
//! ```
//!
//! The image markers must be lines of their own, without surrounding
//! whitespace; `\n` and `\r\n` endings both work. The count markers may sit anywhere
//! within a line; when several lines carry them the last one outside the
//! images region is used.
//!
//! ## Side Documents
//!
//! ```text
//! # 2020
//!
//! | ![2020-01.png](images/2020-01.png) | ![2020-05.jpg](images/2020-05.jpg) | ![2020-06.png](images/2020-06.png) |
//! |---|---|---|
//! | ![2020-09.png](images/2020-09.png) |
//! ```
//!
//! The first row doubles as the table header. Short rows are not padded.

use crate::config::{Config, MarkerConfig, SummaryStyle};
use crate::scan::{ImageSet, YearGroup};
use maud::html;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Document not found: {0}")]
    MissingDocument(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Images begin marker not found: {0}")]
    MissingImagesBegin(String),
    #[error("Images end marker not found: {0}")]
    MissingImagesEnd(String),
    #[error("Images end marker (line {end}) must come after the begin marker (line {begin})")]
    EndBeforeBegin { begin: usize, end: usize },
    #[error("Count marker not found: a line containing {begin}...{end}")]
    MissingCountMarker { begin: String, end: String },
    #[error("Count marker (line {0}) lies inside the generated images region")]
    CountInsideImages(usize),
}

/// A text document as a sequence of lines.
///
/// Lines keep their terminators so untouched lines are copied back byte for
/// byte, whatever line ending the file uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(String::from).collect(),
        }
    }

    /// Read a document from disk.
    pub fn read(path: &Path) -> Result<Self, PatchError> {
        if !path.is_file() {
            return Err(PatchError::MissingDocument(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

/// Line without its terminator.
fn line_content(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Zero-based indices of the three markers in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPositions {
    pub images_begin: usize,
    pub images_end: usize,
    pub count: usize,
}

/// Locate the marker lines, checking every precondition the patch relies on.
pub fn locate_markers(
    document: &Document,
    markers: &MarkerConfig,
) -> Result<MarkerPositions, PatchError> {
    let lines = document.lines();
    let is_line = |line: &String, marker: &str| line_content(line) == marker;

    let images_begin = lines
        .iter()
        .position(|l| is_line(l, &markers.images_begin))
        .ok_or_else(|| PatchError::MissingImagesBegin(markers.images_begin.clone()))?;

    let images_end = match lines[images_begin + 1..]
        .iter()
        .position(|l| is_line(l, &markers.images_end))
    {
        Some(offset) => images_begin + 1 + offset,
        None => {
            return Err(
                match lines.iter().position(|l| is_line(l, &markers.images_end)) {
                    Some(end) => PatchError::EndBeforeBegin {
                        begin: images_begin + 1,
                        end: end + 1,
                    },
                    None => PatchError::MissingImagesEnd(markers.images_end.clone()),
                },
            );
        }
    };

    // Count lines inside the images region are replaced with it, so the
    // last one outside the region is used.
    let is_count = |l: &String| split_count_line(l, markers).is_some();
    let inside = |i: usize| i > images_begin && i < images_end;
    let count = match (0..lines.len())
        .rev()
        .find(|&i| !inside(i) && is_count(&lines[i]))
    {
        Some(count) => count,
        None => {
            return Err(match lines.iter().rposition(is_count) {
                Some(count) => PatchError::CountInsideImages(count + 1),
                None => PatchError::MissingCountMarker {
                    begin: markers.count_begin.clone(),
                    end: markers.count_end.clone(),
                },
            });
        }
    };

    Ok(MarkerPositions {
        images_begin,
        images_end,
        count,
    })
}

/// Split a line around the count markers into the text before the begin
/// marker and the text after the end marker.
///
/// The end marker must follow the begin marker.
pub fn split_count_line<'a>(line: &'a str, markers: &MarkerConfig) -> Option<(&'a str, &'a str)> {
    let begin = line.find(&markers.count_begin)?;
    let after_begin = begin + markers.count_begin.len();
    let end = after_begin + line[after_begin..].find(&markers.count_end)?;
    Some((&line[..begin], &line[end + markers.count_end.len()..]))
}

/// Rewrite the count line with `total` between the markers.
fn rewrite_count_line(line: &str, markers: &MarkerConfig, total: usize) -> Option<String> {
    let (before, after) = split_count_line(line, markers)?;
    Some(format!(
        "{before}{}{total}{}{after}",
        markers.count_begin, markers.count_end
    ))
}

/// A generated per-year side document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideDocument {
    pub year: String,
    pub file_name: String,
    pub image_count: usize,
    pub contents: String,
}

/// Everything a patch produces, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutput {
    pub document: String,
    pub side_documents: Vec<SideDocument>,
}

/// Produce the patched document and the side documents.
pub fn patch(
    document: &Document,
    images: &ImageSet,
    config: &Config,
) -> Result<PatchOutput, PatchError> {
    let positions = locate_markers(document, &config.markers)?;
    let groups = images.groups.ordered(config.group_order);
    let link_base = config.images_link_base();

    // Generated lines follow the document's own line ending.
    let eol = if document.lines()[positions.images_begin].ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    };

    let mut out = String::new();
    for (i, line) in document.lines().iter().enumerate() {
        if i > positions.images_begin && i < positions.images_end {
            continue;
        }
        if i == positions.count {
            match rewrite_count_line(line, &config.markers, images.total()) {
                Some(rewritten) => out.push_str(&rewritten),
                None => out.push_str(line),
            }
        } else {
            out.push_str(line);
        }
        if i == positions.images_begin {
            for summary_line in render_summaries(&groups, config, &link_base) {
                out.push_str(&summary_line);
                out.push_str(eol);
            }
        }
    }

    let side_documents = groups
        .iter()
        .map(|group| SideDocument {
            year: group.year.clone(),
            file_name: config.side_document_name(&group.year),
            image_count: group.images.len(),
            contents: render_side_document(group, config.columns, &link_base),
        })
        .collect();

    Ok(PatchOutput {
        document: out,
        side_documents,
    })
}

/// Write the side documents, then the document itself.
///
/// Writes are plain overwrites. Returns the paths written, in order.
pub fn write_outputs(
    output: &PatchOutput,
    document_path: &Path,
    side_dir: &Path,
) -> Result<Vec<PathBuf>, PatchError> {
    let mut written = Vec::with_capacity(output.side_documents.len() + 1);
    for side in &output.side_documents {
        let path = side_dir.join(&side.file_name);
        write_file(&path, &side.contents)?;
        written.push(path);
    }
    write_file(document_path, &output.document)?;
    written.push(document_path.to_path_buf());
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<(), PatchError> {
    fs::write(path, contents).map_err(|source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Rendering
// ============================================================================

/// Markdown image reference for `name` inside the image directory.
pub fn thumbnail(name: &str, link_base: &str) -> String {
    format!(
        "![{}]({}/{})",
        escape_alt(name),
        link_base,
        encode_link_target(name)
    )
}

/// Escape characters that would end markdown alt text early.
fn escape_alt(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Percent-encode characters that would break a markdown link target.
fn encode_link_target(target: &str) -> String {
    let mut encoded = String::with_capacity(target.len());
    for c in target.chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '(' => encoded.push_str("%28"),
            ')' => encoded.push_str("%29"),
            '<' => encoded.push_str("%3C"),
            '>' => encoded.push_str("%3E"),
            _ => encoded.push(c),
        }
    }
    encoded
}

fn plural_images(count: usize) -> String {
    if count == 1 {
        "1 image".to_string()
    } else {
        format!("{count} images")
    }
}

/// Summary lines for every group, without line terminators.
pub fn render_summaries(groups: &[&YearGroup], config: &Config, link_base: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if config.summary_style == SummaryStyle::Table {
        if groups.is_empty() {
            return lines;
        }
        lines.push("| Year | Images | Preview |".to_string());
        lines.push("|---|---|---|".to_string());
    }
    for group in groups {
        lines.extend(render_summary(group, config, link_base));
    }
    lines
}

/// Summary lines for one year group in the configured style.
fn render_summary(group: &YearGroup, config: &Config, link_base: &str) -> Vec<String> {
    let side = format!("./{}", config.side_document_name(&group.year));
    let count = group.images.len();
    // Groups are never empty
    let preview = match group.images.first() {
        Some(first) => format!("[{}]({side})", thumbnail(first, link_base)),
        None => String::new(),
    };

    match config.summary_style {
        SummaryStyle::Gallery => {
            let caption = html! {
                p align="center" { a href=(side) { (group.year) " (" (count) ")" } }
            };
            vec![preview, caption.into_string(), String::new()]
        }
        SummaryStyle::Sections => vec![
            format!("## {}", group.year),
            String::new(),
            preview,
            String::new(),
            format!("[All {} from {}]({side})", plural_images(count), group.year),
            String::new(),
        ],
        SummaryStyle::Collapsible => {
            let summary = html! { summary { (group.year) " (" (count) ")" } };
            vec![
                "<details>".to_string(),
                summary.into_string(),
                String::new(),
                preview,
                String::new(),
                format!("[All images from {}]({side})", group.year),
                String::new(),
                "</details>".to_string(),
                String::new(),
            ]
        }
        SummaryStyle::Table => vec![format!(
            "| [{year}]({side}) | {count} | {preview} |",
            year = group.year
        )],
    }
}

/// Full contents of a year's side document.
pub fn render_side_document(group: &YearGroup, columns: usize, link_base: &str) -> String {
    let mut out = format!("# {}\n\n", group.year);
    let mut rows = group.images.chunks(columns.max(1));

    if let Some(header) = rows.next() {
        out.push_str(&table_row(header, link_base));
        out.push('|');
        out.push_str(&"---|".repeat(columns.max(1)));
        out.push('\n');
    }
    for row in rows {
        out.push_str(&table_row(row, link_base));
    }
    out
}

fn table_row(images: &[String], link_base: &str) -> String {
    let mut row = String::from("|");
    for image in images {
        row.push(' ');
        row.push_str(&thumbnail(image, link_base));
        row.push_str(" |");
    }
    row.push('\n');
    row
}
