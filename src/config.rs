//! Inventory configuration.
//!
//! Handles loading, validating, and merging `inventory.toml`. The file is
//! optional and lives next to the inventory document; stock defaults are the
//! base layer and the user file overrides only the keys it names.
//!
//! ```text
//! storage/
//! ├── inventory.md
//! ├── inventory.toml     # optional
//! ├── photos/            # originals, one directory per container
//! └── resized/           # generated thumbnails
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [photos]
//! source_dir = "photos"      # originals: {source_dir}/{dir}/*
//! thumbnail_dir = "resized"  # thumbnails: {thumbnail_dir}/{dir}/*
//!
//! [thumbnails]
//! generate = true            # false = never create thumbnails
//!
//! [output]
//! file = "inventory.json"    # relative to the document's directory
//! listings_dir = "photo-listings"
//!
//! [document]
//! prose_sections = []        # level-1 headings kept as prose
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::photos::PhotoLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file next to the inventory document.
pub const CONFIG_FILE: &str = "inventory.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Inventory configuration loaded from `inventory.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InventoryConfig {
    /// Where originals and thumbnails live.
    pub photos: PhotosConfig,
    /// Thumbnail generation switch.
    pub thumbnails: ThumbnailsConfig,
    /// Output file locations.
    pub output: OutputConfig,
    /// Document structure options.
    pub document: DocumentConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl InventoryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_relative("photos.source_dir", &self.photos.source_dir)?;
        check_relative("photos.thumbnail_dir", &self.photos.thumbnail_dir)?;
        check_relative("output.file", &self.output.file)?;
        check_relative("output.listings_dir", &self.output.listings_dir)?;
        if self.photos.source_dir == self.photos.thumbnail_dir {
            return Err(ConfigError::Validation(
                "photos.source_dir and photos.thumbnail_dir must differ".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Directory layout used by photo resolution and thumbnailing.
    pub fn photo_layout(&self) -> PhotoLayout {
        PhotoLayout {
            source_dir: self.photos.source_dir.clone(),
            thumbnail_dir: self.photos.thumbnail_dir.clone(),
        }
    }
}

fn check_relative(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    if Path::new(value).is_absolute() {
        return Err(ConfigError::Validation(format!(
            "{key} must be a relative path, got '{value}'"
        )));
    }
    Ok(())
}

/// Photo directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotosConfig {
    pub source_dir: String,
    pub thumbnail_dir: String,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        let layout = PhotoLayout::default();
        Self {
            source_dir: layout.source_dir,
            thumbnail_dir: layout.thumbnail_dir,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Create missing thumbnails during `parse`.
    pub generate: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self { generate: true }
    }
}

/// Output locations, relative to the document's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub file: String,
    pub listings_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: "inventory.json".to_string(),
            listings_dir: "photo-listings".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    /// Level-1 heading titles whose body is kept as prose instead of
    /// becoming a container.
    pub prose_sections: Vec<String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(InventoryConfig::default())?)
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

/// Load `inventory.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<InventoryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: InventoryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `inventory.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<InventoryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `inventory.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Inventory Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file next to the inventory document as `inventory.toml`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Photo directories (relative to the document)
# ---------------------------------------------------------------------------
[photos]
# Originals live in {source_dir}/{dir}/, one directory per container.
source_dir = "photos"
# Thumbnails are written to {thumbnail_dir}/{dir}/ with the same file name.
thumbnail_dir = "resized"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Create missing thumbnails (longer edge 800px) while parsing.
# Existing thumbnails are never touched.
generate = true

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JSON inventory written by `parse`.
file = "inventory.json"
# Directory for the per-container text files written by `listings`.
listings_dir = "photo-listings"

# ---------------------------------------------------------------------------
# Document structure
# ---------------------------------------------------------------------------
[document]
# Level-1 headings whose body is kept as free text in "sections"
# instead of becoming a container, e.g. ["Intro"].
prose_sections = []

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers. Omit for auto (= number of CPU cores).
# Values larger than the core count are clamped down.
# max_processes = 4
"##
}
