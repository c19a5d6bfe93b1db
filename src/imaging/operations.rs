//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_within;
use super::params::{Encoding, Quality, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Longer edge of a thumbnail, in pixels.
pub const THUMBNAIL_MAX_EDGE: u32 = 800;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub max_edge: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_edge: THUMBNAIL_MAX_EDGE,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Fails only when the source format has no encoder.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    source_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> Result<ThumbnailParams> {
    let encoding = Encoding::for_source(source, config.quality).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "Unsupported image format: {}",
            source.display()
        ))
    })?;
    let (width, height) = fit_within(source_dims, config.max_edge);

    Ok(ThumbnailParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        encoding,
    })
}

/// Create a thumbnail of `source` at `output_path`.
///
/// The output is encoded in the source's format regardless of the output
/// path's extension, so callers may write to a temporary name first.
/// Returns the thumbnail's dimensions.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output_path: &Path,
    config: &ThumbnailConfig,
) -> Result<Dimensions> {
    let dims = get_dimensions(backend, source)?;
    let params = plan_thumbnail(source, output_path, dims, config)?;
    backend.thumbnail(&params)?;
    Ok(Dimensions {
        width: params.width,
        height: params.height,
    })
}
