//! End-to-end runs over a project root.
//!
//! ```text
//! 1. Preconditions  config + document + markers    (nothing written yet)
//! 2. Scan           images/ → renames + ImageSet
//! 3. Patch          document + ImageSet → new document + side documents
//! 4. Write          side documents, then the document
//! ```
//!
//! Every precondition is checked before the first rename so a missing marker
//! never leaves the images directory half-renamed.

use crate::config::{self, Config, ConfigError};
use crate::patch::{self, Document, PatchError, PatchOutput};
use crate::scan::{self, ImageSet, Rename, ScanError, ScanPlan};
use crate::timestamps::TimestampSource;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),
}

/// A project root together with its resolved configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Load the project at `root`, reading `config_path` or the default
    /// `readme-gallery.toml` in the root.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self, RunError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(config::CONFIG_FILENAME));
        let config = config::load_config(&config_path)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn with_config(root: &Path, config: Config) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    pub fn readme_file(&self) -> PathBuf {
        self.config.readme_file(&self.root)
    }

    pub fn images_path(&self) -> PathBuf {
        self.config.images_path(&self.root)
    }

    pub fn document_dir(&self) -> PathBuf {
        self.config.document_dir(&self.root)
    }

    /// Read the document and check that its markers are usable.
    fn read_document(&self) -> Result<Document, RunError> {
        let document = Document::read(&self.readme_file())?;
        patch::locate_markers(&document, &self.config.markers)?;
        Ok(document)
    }

    /// Plan and apply renames, reporting each one before it happens.
    fn scan_and_rename(
        &self,
        timestamps: &dyn TimestampSource,
        on_rename: &mut dyn FnMut(&Rename),
    ) -> Result<ImageSet, RunError> {
        let dir = self.images_path();
        let plan = scan::plan(&dir, &self.config, timestamps)?;
        for rename in &plan.renames {
            on_rename(rename);
            scan::apply_rename(&dir, rename)?;
        }
        Ok(plan.into_image_set())
    }
}

/// Outcome of a full build.
#[derive(Debug)]
pub struct BuildReport {
    pub images: ImageSet,
    pub output: PatchOutput,
    /// Files written, side documents first.
    pub written: Vec<PathBuf>,
}

/// Outcome of a dry run.
#[derive(Debug)]
pub struct CheckReport {
    pub plan: ScanPlan,
    pub images: ImageSet,
    /// Side documents that are missing or would change.
    pub stale_side_documents: Vec<String>,
    /// Whether the document would change.
    pub document_stale: bool,
}

impl CheckReport {
    /// True when a build would neither rename nor rewrite anything.
    pub fn is_up_to_date(&self) -> bool {
        self.plan.renames.is_empty() && !self.document_stale && self.stale_side_documents.is_empty()
    }
}

/// Scan, rename, patch and write.
pub fn build(
    project: &Project,
    timestamps: &dyn TimestampSource,
    on_rename: &mut dyn FnMut(&Rename),
) -> Result<BuildReport, RunError> {
    let document = project.read_document()?;
    let images = project.scan_and_rename(timestamps, on_rename)?;
    let output = patch::patch(&document, &images, &project.config)?;
    let written = patch::write_outputs(&output, &project.readme_file(), &project.document_dir())?;
    Ok(BuildReport {
        images,
        output,
        written,
    })
}

/// Validate the project and report what a build would change, writing
/// nothing.
pub fn check(
    project: &Project,
    timestamps: &dyn TimestampSource,
) -> Result<CheckReport, RunError> {
    let document = project.read_document()?;
    let plan = scan::plan(&project.images_path(), &project.config, timestamps)?;
    let images = plan.clone().into_image_set();
    let output = patch::patch(&document, &images, &project.config)?;

    let side_dir = project.document_dir();
    let stale_side_documents = output
        .side_documents
        .iter()
        .filter(|side| {
            std::fs::read_to_string(side_dir.join(&side.file_name))
                .map(|existing| existing != side.contents)
                .unwrap_or(true)
        })
        .map(|side| side.file_name.clone())
        .collect();

    Ok(CheckReport {
        document_stale: output.document != document.to_text(),
        plan,
        images,
        stale_side_documents,
    })
}

/// Scan and rename only, leaving the document alone.
pub fn scan_only(
    project: &Project,
    timestamps: &dyn TimestampSource,
    on_rename: &mut dyn FnMut(&Rename),
) -> Result<ImageSet, RunError> {
    project.scan_and_rename(timestamps, on_rename)
}
