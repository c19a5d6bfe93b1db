//! Photo directory resolution and image discovery.
//!
//! Every container owns (or shares) a directory under the photo root. The
//! directory name comes from the first source that applies:
//!
//! 1. an explicit `photos:` token in the heading,
//! 2. a deprecated `[text](photos/DIR/)` link line in the container body,
//! 3. the container's own id.
//!
//! Several containers may resolve to the same directory; each distinct
//! directory is listed once and the result shared. A missing or empty
//! directory simply yields no images.
//!
//! ```text
//! photos/A78/IMG_0001.jpg  →  source:    photos/A78/IMG_0001.jpg
//!                             thumbnail: resized/A78/IMG_0001.jpg
//! ```

use crate::types::{Container, Image};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Where a container's photo directory name came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhotoSource {
    Explicit,
    /// Read-only compatibility with old documents; never written.
    LegacyLink,
    ContainerId,
}

/// Directory names for originals and thumbnails, relative to the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoLayout {
    pub source_dir: String,
    pub thumbnail_dir: String,
}

impl Default for PhotoLayout {
    fn default() -> Self {
        Self {
            source_dir: "photos".to_string(),
            thumbnail_dir: "resized".to_string(),
        }
    }
}

/// Recoverable problems found while resolving photos.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoWarning {
    /// The resolved name would escape the photo root.
    UnsafeDirectory { container: String, dir: String },
    /// The directory exists but could not be read.
    UnreadableDirectory { dir: String, error: String },
}

impl fmt::Display for PhotoWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoWarning::UnsafeDirectory { container, dir } => {
                write!(f, "{container}: photo directory '{dir}' ignored (not a plain name)")
            }
            PhotoWarning::UnreadableDirectory { dir, error } => {
                write!(f, "photo directory '{dir}' unreadable: {error}")
            }
        }
    }
}

/// Pick the photo directory name for one container.
pub fn resolve_dir(container: &Container) -> (&str, PhotoSource) {
    if let Some(dir) = &container.photos {
        (dir.as_str(), PhotoSource::Explicit)
    } else if let Some(dir) = &container.photos_link {
        (dir.as_str(), PhotoSource::LegacyLink)
    } else {
        (container.id.as_str(), PhotoSource::ContainerId)
    }
}

/// A directory name is usable only if it names a direct child of the root.
pub fn is_safe_dir(dir: &str) -> bool {
    !dir.is_empty() && dir != "." && !dir.contains(['/', '\\']) && !dir.contains("..")
}

pub fn is_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Image filenames in `path`, in canonical order.
///
/// A missing directory is an empty listing, not an error.
pub fn image_filenames(path: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_image(p))
        .filter_map(|p| {
            let name = p.file_name()?.to_str().map(str::to_string);
            if name.is_none() {
                debug!(path = %p.display(), "skipping non UTF-8 filename");
            }
            name
        })
        .collect();

    names.sort_by_cached_key(|n| (n.to_lowercase(), n.clone()));
    Ok(names)
}

/// List the images of one photo directory.
pub fn list_images(base: &Path, layout: &PhotoLayout, dir: &str) -> io::Result<Vec<Image>> {
    let names = image_filenames(&base.join(&layout.source_dir).join(dir))?;
    Ok(names
        .into_iter()
        .map(|filename| Image {
            source_path: format!("{}/{}/{}", layout.source_dir, dir, filename),
            thumbnail_path: format!("{}/{}/{}", layout.thumbnail_dir, dir, filename),
            filename,
        })
        .collect())
}

/// Fill in `photos_dir` and `images` for every container.
///
/// `base` is the document's directory. Distinct directories are listed in
/// parallel; problems are returned as warnings and never abort.
pub fn resolve(containers: &mut [Container], base: &Path, layout: &PhotoLayout) -> Vec<PhotoWarning> {
    let mut warnings = Vec::new();
    let mut dirs = BTreeSet::new();

    for container in containers.iter_mut() {
        let (dir, source) = resolve_dir(container);
        let dir = dir.to_string();
        debug!(container = %container.id, dir = %dir, ?source, "photo directory");
        if is_safe_dir(&dir) {
            dirs.insert(dir.clone());
        } else {
            warn!(container = %container.id, dir = %dir, "unsafe photo directory name");
            warnings.push(PhotoWarning::UnsafeDirectory {
                container: container.id.clone(),
                dir: dir.clone(),
            });
        }
        container.photos_dir = dir;
    }

    let listings: Vec<(String, io::Result<Vec<Image>>)> = dirs
        .into_par_iter()
        .map(|dir| {
            let images = list_images(base, layout, &dir);
            (dir, images)
        })
        .collect();

    let mut by_dir: BTreeMap<String, Vec<Image>> = BTreeMap::new();
    for (dir, result) in listings {
        match result {
            Ok(images) => {
                by_dir.insert(dir, images);
            }
            Err(e) => {
                warn!(dir = %dir, error = %e, "cannot read photo directory");
                warnings.push(PhotoWarning::UnreadableDirectory {
                    dir,
                    error: e.to_string(),
                });
            }
        }
    }

    for container in containers.iter_mut() {
        if let Some(images) = by_dir.get(&container.photos_dir) {
            container.images = images.clone();
        }
    }

    warnings
}
