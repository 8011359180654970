//! Gallery configuration module.
//!
//! Handles loading, validating, and merging the optional
//! `readme-gallery.toml` file. Stock defaults reproduce the classic layout
//! (`README.md` + `images/`, three columns, newest year first); a config file
//! only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! readme_path = "README.md"          # Document to patch, relative to the root
//! images_dir = "images"              # Image directory, relative to the root
//! side_document_prefix = "images_"   # Side documents are <prefix><year>.md
//! columns = 3                        # Cells per row in side document tables
//! group_order = "newest-first"       # or "first-seen"
//! summary_style = "gallery"          # gallery | sections | collapsible | table
//! extensions = ["png", "jpg"]        # Matched case-insensitively
//! exclude_ignore_prefix = true       # Skip images whose name starts with...
//! ignore_prefix = "_ignore"          # ...this prefix
//! timestamp_source = "created"       # or "modified"
//!
//! [markers]
//! images_begin = "<!-- BEGIN IMAGES -->"
//! images_end = "<!-- END IMAGES -->"
//! count_begin = "<!-- BEGIN COUNT -->`"
//! count_end = "`<!-- END COUNT -->"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the project root.
pub const CONFIG_FILENAME: &str = "readme-gallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Order in which year groups appear in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrder {
    /// Descending year.
    NewestFirst,
    /// Order in which each year was first encountered during the scan.
    FirstSeen,
}

/// Layout preset for the per-year summary blocks in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    /// Clickable preview thumbnail with a centered caption link.
    Gallery,
    /// A `##` heading per year with the preview and a link line.
    Sections,
    /// A `<details>` block per year.
    Collapsible,
    /// One markdown table with a row per year.
    Table,
}

/// Which filesystem timestamp dates an undated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampKind {
    /// Birth time, falling back to modification time where unsupported.
    Created,
    Modified,
}

/// Configuration loaded from `readme-gallery.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Document to patch, relative to the project root.
    pub readme_path: String,
    /// Image directory, relative to the project root.
    pub images_dir: String,
    /// Side documents are written as `<prefix><year>.md` next to the document.
    pub side_document_prefix: String,
    /// Cells per row in side document tables.
    pub columns: usize,
    pub group_order: GroupOrder,
    pub summary_style: SummaryStyle,
    /// Supported image extensions, without the dot.
    pub extensions: Vec<String>,
    pub exclude_ignore_prefix: bool,
    pub ignore_prefix: String,
    pub timestamp_source: TimestampKind,
    pub markers: MarkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readme_path: "README.md".to_string(),
            images_dir: "images".to_string(),
            side_document_prefix: "images_".to_string(),
            columns: 3,
            group_order: GroupOrder::NewestFirst,
            summary_style: SummaryStyle::Gallery,
            extensions: vec!["png".to_string(), "jpg".to_string()],
            exclude_ignore_prefix: true,
            ignore_prefix: "_ignore".to_string(),
            timestamp_source: TimestampKind::Created,
            markers: MarkerConfig::default(),
        }
    }
}

/// Literal markers delimiting the generated regions of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    /// Own line opening the generated image region.
    pub images_begin: String,
    /// Own line closing the generated image region.
    pub images_end: String,
    /// Substring preceding the image count.
    pub count_begin: String,
    /// Substring following the image count.
    pub count_end: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            images_begin: "<!-- BEGIN IMAGES -->".to_string(),
            images_end: "<!-- END IMAGES -->".to_string(),
            count_begin: "<!-- BEGIN COUNT -->`".to_string(),
            count_end: "`<!-- END COUNT -->".to_string(),
        }
    }
}

impl Config {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 {
            return Err(ConfigError::Validation("columns must be at least 1".into()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.contains('.'))
        {
            return Err(ConfigError::Validation(format!(
                "invalid extension {ext:?}: use the bare extension, e.g. \"png\""
            )));
        }
        if self.exclude_ignore_prefix && self.ignore_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "ignore_prefix must not be empty when exclude_ignore_prefix is set".into(),
            ));
        }
        if self.side_document_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "side_document_prefix must not contain path separators".into(),
            ));
        }
        check_relative("readme_path", &self.readme_path)?;
        check_relative("images_dir", &self.images_dir)?;
        if Path::new(&self.readme_path).file_name().is_none() {
            return Err(ConfigError::Validation(
                "readme_path must name a file".into(),
            ));
        }

        let m = &self.markers;
        for (key, value) in [
            ("markers.images_begin", &m.images_begin),
            ("markers.images_end", &m.images_end),
            ("markers.count_begin", &m.count_begin),
            ("markers.count_end", &m.count_end),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if value.contains('\n') {
                return Err(ConfigError::Validation(format!(
                    "{key} must fit on a single line"
                )));
            }
        }
        if m.images_begin == m.images_end {
            return Err(ConfigError::Validation(
                "markers.images_begin and markers.images_end must differ".into(),
            ));
        }
        Ok(())
    }

    /// Whether `ext` (without the dot) is a supported image extension.
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Absolute location of the document for a project root.
    pub fn readme_file(&self, root: &Path) -> PathBuf {
        root.join(&self.readme_path)
    }

    /// Absolute location of the image directory for a project root.
    pub fn images_path(&self, root: &Path) -> PathBuf {
        root.join(&self.images_dir)
    }

    /// Directory the document and its side documents live in.
    pub fn document_dir(&self, root: &Path) -> PathBuf {
        self.readme_file(root)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf())
    }

    /// File name of the side document for `year`.
    pub fn side_document_name(&self, year: &str) -> String {
        format!("{}{}.md", self.side_document_prefix, year)
    }

    /// Image directory as a link target relative to the document.
    ///
    /// Both paths are validated to be plain relative paths, so climbing out
    /// of the document's directory is a matter of one `..` per component.
    pub fn images_link_base(&self) -> String {
        let depth = Path::new(&self.readme_path)
            .parent()
            .map(|p| {
                p.components()
                    .filter(|c| matches!(c, Component::Normal(_)))
                    .count()
            })
            .unwrap_or(0);
        let mut parts: Vec<String> = vec!["..".to_string(); depth];
        parts.extend(
            Path::new(&self.images_dir)
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        );
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

fn check_relative(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    let ok = Path::new(value)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !ok {
        return Err(ConfigError::Validation(format!(
            "{key} must be a relative path inside the project root: {value}"
        )));
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when the
/// file does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `readme-gallery.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# readme-gallery configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Document to patch, relative to the project root.
readme_path = "README.md"

# Directory holding the images, relative to the project root.
images_dir = "images"

# Per-year side documents are written next to the document as
# <side_document_prefix><year>.md
side_document_prefix = "images_"

# Cells per row in the side document tables.
columns = 3

# Year order in the document: "newest-first" or "first-seen".
group_order = "newest-first"

# Summary block layout: "gallery", "sections", "collapsible" or "table".
summary_style = "gallery"

# Image extensions to pick up (case-insensitive, without the dot).
extensions = ["png", "jpg"]

# Skip images whose file name starts with ignore_prefix.
exclude_ignore_prefix = true
ignore_prefix = "_ignore"

# Timestamp used to date images without a YYYY-MM prefix:
# "created" (falls back to "modified" where unsupported) or "modified".
timestamp_source = "created"

# ---------------------------------------------------------------------------
# Document markers
# ---------------------------------------------------------------------------
[markers]
# Own lines delimiting the generated image region.
images_begin = "<!-- BEGIN IMAGES -->"
images_end = "<!-- END IMAGES -->"

# The image count is written between these two substrings.
count_begin = "<!-- BEGIN COUNT -->`"
count_end = "`<!-- END COUNT -->"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.readme_path, "README.md");
        assert_eq!(config.images_dir, "images");
        assert_eq!(config.columns, 3);
        assert_eq!(config.group_order, GroupOrder::NewestFirst);
        assert_eq!(config.summary_style, SummaryStyle::Gallery);
        assert_eq!(config.extensions, vec!["png", "jpg"]);
        assert!(config.exclude_ignore_prefix);
        assert_eq!(config.markers.images_begin, "<!-- BEGIN IMAGES -->");
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
columns = 4
summary_style = "collapsible"

[markers]
images_begin = "<!-- GALLERY -->"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.columns, 4);
        assert_eq!(config.summary_style, SummaryStyle::Collapsible);
        assert_eq!(config.markers.images_begin, "<!-- GALLERY -->");
        // Defaults preserved
        assert_eq!(config.markers.images_end, "<!-- END IMAGES -->");
        assert_eq!(config.group_order, GroupOrder::NewestFirst);
    }

    #[test]
    fn parse_enum_values() {
        let config: Config = toml::from_str(
            r#"
group_order = "first-seen"
timestamp_source = "modified"
"#,
        )
        .unwrap();
        assert_eq!(config.group_order, GroupOrder::FirstSeen);
        assert_eq!(config.timestamp_source, TimestampKind::Modified);
    }

    #[test]
    fn unknown_enum_value_rejected() {
        let result: Result<Config, _> = toml::from_str(r#"summary_style = "carousel""#);
        assert!(result.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.columns, 3);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "images_dir = \"screenshots\"\ncolumns = 2\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.images_dir, "screenshots");
        assert_eq!(config.columns, 2);
        assert_eq!(config.readme_path, "README.md");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "columns = [[[").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "colums = 3\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<Config, _> = toml::from_str("[markers]\nbegin = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_toml_round_trips_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.columns, defaults.columns);
        assert_eq!(config.extensions, defaults.extensions);
        assert_eq!(config.markers.count_end, defaults.markers.count_end);
        assert_eq!(config.summary_style, defaults.summary_style);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("columns = 3").unwrap();
        let overlay: toml::Value = toml::from_str("columns = 5").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("columns").unwrap().as_integer(), Some(5));
    }

    #[test]
    fn merge_toml_nested_table_preserves_base_keys() {
        let merged = merge_toml(
            stock_defaults_value(),
            toml::from_str("[markers]\ncount_begin = \"<!-- N -->\"\n").unwrap(),
        );
        let config: Config = merged.try_into().unwrap();
        assert_eq!(config.markers.count_begin, "<!-- N -->");
        assert_eq!(config.markers.count_end, "`<!-- END COUNT -->");
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let merged = merge_toml(
            stock_defaults_value(),
            toml::from_str("extensions = [\"webp\"]").unwrap(),
        );
        let config: Config = merged.try_into().unwrap();
        assert_eq!(config.extensions, vec!["webp"]);
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    fn validation_error(config: Config) -> String {
        match config.validate() {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_zero_columns() {
        let config = Config {
            columns: 0,
            ..Config::default()
        };
        assert!(validation_error(config).contains("columns"));
    }

    #[test]
    fn validate_empty_extensions() {
        let config = Config {
            extensions: vec![],
            ..Config::default()
        };
        assert!(validation_error(config).contains("extensions"));
    }

    #[test]
    fn validate_dotted_extension() {
        let config = Config {
            extensions: vec![".png".to_string()],
            ..Config::default()
        };
        assert!(validation_error(config).contains(".png"));
    }

    #[test]
    fn validate_empty_ignore_prefix_only_when_enabled() {
        let mut config = Config {
            ignore_prefix: String::new(),
            ..Config::default()
        };
        assert!(validation_error(config.clone()).contains("ignore_prefix"));
        config.exclude_ignore_prefix = false;
        config.validate().unwrap();
    }

    #[test]
    fn validate_identical_image_markers() {
        let mut config = Config::default();
        config.markers.images_end = config.markers.images_begin.clone();
        assert!(validation_error(config).contains("must differ"));
    }

    #[test]
    fn validate_blank_marker() {
        let mut config = Config::default();
        config.markers.count_end = "  ".to_string();
        assert!(validation_error(config).contains("markers.count_end"));
    }

    #[test]
    fn validate_escaping_paths() {
        let config = Config {
            images_dir: "../elsewhere".to_string(),
            ..Config::default()
        };
        assert!(validation_error(config).contains("images_dir"));

        let config = Config {
            readme_path: "/etc/README.md".to_string(),
            ..Config::default()
        };
        assert!(validation_error(config).contains("readme_path"));
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    #[test]
    fn supported_extension_ignores_case() {
        let config = Config::default();
        assert!(config.is_supported_extension("png"));
        assert!(config.is_supported_extension("JPG"));
        assert!(!config.is_supported_extension("jpeg"));
        assert!(!config.is_supported_extension("txt"));
    }

    #[test]
    fn side_document_name_uses_prefix() {
        assert_eq!(Config::default().side_document_name("2020"), "images_2020.md");
        let config = Config {
            side_document_prefix: "shots-".to_string(),
            ..Config::default()
        };
        assert_eq!(config.side_document_name("2021"), "shots-2021.md");
    }

    #[test]
    fn images_link_base_at_root() {
        assert_eq!(Config::default().images_link_base(), "images");
        let config = Config {
            images_dir: "./assets/shots".to_string(),
            ..Config::default()
        };
        assert_eq!(config.images_link_base(), "assets/shots");
    }

    #[test]
    fn images_link_base_from_nested_document() {
        let config = Config {
            readme_path: "docs/GALLERY.md".to_string(),
            ..Config::default()
        };
        assert_eq!(config.images_link_base(), "../images");
    }

    #[test]
    fn document_dir_follows_readme_path() {
        let root = Path::new("/project");
        let config = Config {
            readme_path: "docs/README.md".to_string(),
            ..Config::default()
        };
        assert_eq!(config.document_dir(root), Path::new("/project/docs"));
        assert_eq!(Config::default().document_dir(root), Path::new("/project"));
    }
}
