//! Shared test utilities.
//!
//! Builders for flat [`Container`]s and helpers that put files and
//! synthesized images on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_jpeg(&tmp.path().join("photos/A78/a.jpg"), 1600, 1200);
//!
//! let shelf = container_with_images("A78-1", "A78", &["a.jpg"]);
//! assert_eq!(shelf.images[0].thumbnail_path, "resized/A78/a.jpg");
//! ```

use crate::types::{Container, Image};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// =========================================================================
// Container builders
// =========================================================================

/// A root container whose label equals its id.
pub fn container(id: &str) -> Container {
    Container {
        id: id.to_string(),
        label: id.to_string(),
        parent: None,
        heading_level: 1,
        kind: None,
        tags: Vec::new(),
        photos: None,
        photos_link: None,
        description: String::new(),
        metadata: BTreeMap::new(),
        items: Vec::new(),
        line: 1,
        photos_dir: String::new(),
        images: Vec::new(),
    }
}

/// A container already resolved to `dir` with the given image files.
pub fn container_with_images(id: &str, dir: &str, names: &[&str]) -> Container {
    let mut c = container(id);
    c.photos_dir = dir.to_string();
    c.images = names
        .iter()
        .map(|name| Image {
            filename: name.to_string(),
            source_path: format!("photos/{dir}/{name}"),
            thumbnail_path: format!("resized/{dir}/{name}"),
        })
        .collect();
    c
}

// =========================================================================
// Files on disk
// =========================================================================

/// Create an empty file, including parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

/// Write a solid-color JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let pixels = vec![128u8; (width * height * 3) as usize];
    let file = fs::File::create(path).unwrap();
    JpegEncoder::new_with_quality(file, 90)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a half-transparent RGBA PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(width, height, Rgba([40, 80, 160, 128]))
        .save(path)
        .unwrap();
}
