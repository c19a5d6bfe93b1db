//! End-to-end inventory build.
//!
//! ```text
//! inventory.md ──parse──▶ containers ──photos──▶ with images
//!      ──assemble──▶ Document ──thumbnails──▶ resized/ ──write──▶ inventory.json
//! ```
//!
//! Every fatal problem (unreadable document, bad config, duplicate id,
//! dangling parent, cycle) is detected before anything is written, so a
//! failed run never leaves a partial inventory behind. Thumbnails are only
//! generated once the tree has validated.

use crate::assemble::{self, AssembleError};
use crate::atomic::write_atomic;
use crate::config::{self, ConfigError, InventoryConfig};
use crate::parse::{self, ParseError, ParseWarning};
use crate::photos::{self, PhotoWarning};
use crate::process::{self, ProcessError, ProcessEvent, ThumbnailStats};
use crate::types::Document;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot read {}: {source}", path.display())]
    UnreadableDocument {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid inventory: {0}")]
    Assemble(#[from] AssembleError),
    #[error("Thumbnail error: {0}")]
    Process(#[from] ProcessError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Output path; defaults to `output.file` from the config, relative to
    /// the document's directory.
    pub output: Option<PathBuf>,
    /// Validate only: no thumbnails, no output file.
    pub check_only: bool,
    /// Overrides `thumbnails.generate` when set.
    pub generate_thumbnails: Option<bool>,
}

#[derive(Debug)]
pub struct RunResult {
    pub document: Document,
    pub parse_warnings: Vec<ParseWarning>,
    pub photo_warnings: Vec<PhotoWarning>,
    /// `None` when thumbnailing was skipped.
    pub stats: Option<ThumbnailStats>,
    /// `None` in check-only mode.
    pub output_path: Option<PathBuf>,
}

/// The directory holding the document; photo paths are relative to it.
pub fn document_dir(document_path: &Path) -> &Path {
    match document_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Build the inventory for `document_path`, loading `inventory.toml` from
/// the same directory.
pub fn run(
    document_path: &Path,
    options: &RunOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunResult, PipelineError> {
    let config = config::load_config(document_dir(document_path))?;
    run_with_config(document_path, &config, options, events)
}

pub fn run_with_config(
    document_path: &Path,
    config: &InventoryConfig,
    options: &RunOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunResult, PipelineError> {
    let base = document_dir(document_path);
    let text = fs::read_to_string(document_path).map_err(|source| {
        PipelineError::UnreadableDocument {
            path: document_path.to_path_buf(),
            source,
        }
    })?;

    let parsed = parse::parse(&text, &config.document.prose_sections)?;
    let mut containers = parsed.containers;
    let photo_warnings = photos::resolve(&mut containers, base, &config.photo_layout());
    let jobs = process::plan_jobs(&containers, base);

    let document = assemble::assemble(parsed.sections, containers)?;
    info!(
        containers = document.iter().count(),
        images = jobs.len(),
        "inventory assembled"
    );

    let generate = options
        .generate_thumbnails
        .unwrap_or(config.thumbnails.generate);
    let stats = if options.check_only || !generate {
        None
    } else {
        let threads = config::effective_threads(&config.processing);
        Some(process::generate_thumbnails(&jobs, threads, events)?)
    };

    let output_path = if options.check_only {
        None
    } else {
        let path = options
            .output
            .clone()
            .unwrap_or_else(|| base.join(&config.output.file));
        write_document(&document, &path)?;
        info!(path = %path.display(), "inventory written");
        Some(path)
    };

    Ok(RunResult {
        document,
        parse_warnings: parsed.warnings,
        photo_warnings,
        stats,
        output_path,
    })
}

/// Serialize `document` as pretty JSON and replace `path` atomically.
pub fn write_document(document: &Document, path: &Path) -> Result<(), PipelineError> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;
    Ok(())
}
