//! Per-directory photo listings.
//!
//! Writes `{listings_dir}/{dir}.txt` for every non-empty directory under the
//! photo root: one image filename per line, in the same order the inventory
//! uses. Directories without images get no listing file.

use crate::atomic::write_atomic;
use crate::photos;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Photo directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One listing file that was written.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryListing {
    pub dir: String,
    pub image_count: usize,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct ListingSummary {
    /// Subdirectories of the photo root that were examined.
    pub directories: usize,
    /// Listing files written, in directory name order.
    pub written: Vec<DirectoryListing>,
}

impl ListingSummary {
    pub fn files_written(&self) -> usize {
        self.written.len()
    }
}

/// Write a listing for every non-empty subdirectory of `photo_root`.
pub fn write_listings(photo_root: &Path, listings_dir: &Path) -> Result<ListingSummary, ListingError> {
    if !photo_root.is_dir() {
        return Err(ListingError::MissingRoot(photo_root.to_path_buf()));
    }

    let mut summary = ListingSummary::default();
    let walker = WalkDir::new(photo_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(dir) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %entry.path().display(), "skipping non UTF-8 directory name");
            continue;
        };
        summary.directories += 1;

        let names = photos::image_filenames(entry.path())?;
        if names.is_empty() {
            debug!(dir = %dir, "no images, no listing");
            continue;
        }

        let path = listings_dir.join(format!("{dir}.txt"));
        let mut contents = names.join("\n");
        contents.push('\n');
        write_atomic(&path, contents.as_bytes())?;
        debug!(dir = %dir, images = names.len(), "listing written");

        summary.written.push(DirectoryListing {
            dir,
            image_count: names.len(),
            path,
        });
    }

    info!(
        directories = summary.directories,
        files = summary.files_written(),
        "photo listings written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::touch;
    use std::fs;

    #[test]
    fn writes_sorted_listing_per_non_empty_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let photos = tmp.path().join("photos");
        touch(&photos.join("A78/b.JPG"));
        touch(&photos.join("A78/a.jpg"));
        touch(&photos.join("A78/notes.txt"));
        touch(&photos.join("Box1/x.png"));
        fs::create_dir_all(photos.join("empty")).unwrap();

        let out = tmp.path().join("photo-listings");
        let summary = write_listings(&photos, &out).unwrap();

        assert_eq!(summary.directories, 3);
        assert_eq!(summary.files_written(), 2);
        assert_eq!(summary.written[0].dir, "A78");
        assert_eq!(summary.written[0].image_count, 2);

        assert_eq!(fs::read_to_string(out.join("A78.txt")).unwrap(), "a.jpg\nb.JPG\n");
        assert_eq!(fs::read_to_string(out.join("Box1.txt")).unwrap(), "x.png\n");
        assert!(!out.join("empty.txt").exists());
    }

    #[test]
    fn loose_files_in_root_are_ignored() {
        let tmp = tempfile::TempDir::new().unwrap();
        let photos = tmp.path().join("photos");
        touch(&photos.join("stray.jpg"));

        let summary = write_listings(&photos, &tmp.path().join("out")).unwrap();
        assert_eq!(summary.directories, 0);
        assert_eq!(summary.files_written(), 0);
    }

    #[test]
    fn rewrites_existing_listing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let photos = tmp.path().join("photos");
        let out = tmp.path().join("out");
        touch(&photos.join("A/one.jpg"));
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("A.txt"), "stale\n").unwrap();

        write_listings(&photos, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("A.txt")).unwrap(), "one.jpg\n");
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = write_listings(&tmp.path().join("nope"), &tmp.path().join("out"));
        assert!(matches!(result, Err(ListingError::MissingRoot(_))));
    }
}
