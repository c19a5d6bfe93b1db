//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides the
//! output size) and the [`backend`](super::backend) (which does the pixel
//! work), so a mock backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`Encoding`] — Output format, always the source image's own format.
//! - [`ThumbnailParams`] — Source, output path, exact output dimensions, encoding.

use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// How a thumbnail is encoded. PNG and GIF are lossless and take no quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Jpeg(Quality),
    Png,
    Gif,
}

impl Encoding {
    /// Encoding matching the source file's extension, if supported.
    pub fn for_source(path: &Path, quality: Quality) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Encoding::Jpeg(quality)),
            "png" => Some(Encoding::Png),
            "gif" => Some(Encoding::Gif),
            _ => None,
        }
    }
}

/// Parameters for a thumbnail operation (resize to exact size + re-encode).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn encoding_follows_source_extension() {
        let q = Quality::default();
        assert_eq!(
            Encoding::for_source(Path::new("a/B.JPG"), q),
            Some(Encoding::Jpeg(q))
        );
        assert_eq!(Encoding::for_source(Path::new("x.jpeg"), q), Some(Encoding::Jpeg(q)));
        assert_eq!(Encoding::for_source(Path::new("x.png"), q), Some(Encoding::Png));
        assert_eq!(Encoding::for_source(Path::new("x.Gif"), q), Some(Encoding::Gif));
        assert_eq!(Encoding::for_source(Path::new("x.webp"), q), None);
        assert_eq!(Encoding::for_source(Path::new("noext"), q), None);
    }
}
