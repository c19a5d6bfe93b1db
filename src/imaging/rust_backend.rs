//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF) | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG, GIF | `DynamicImage::write_to` |
//!
//! JPEG has no alpha channel, so transparent sources are flattened onto a
//! white background before encoding.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Encoding, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Composite onto white and drop the alpha channel.
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn save_image(img: &DynamicImage, path: &Path, encoding: Encoding) -> Result<(), BackendError> {
    let file = File::create(path).map_err(BackendError::Io)?;
    let mut writer = BufWriter::new(file);

    match encoding {
        Encoding::Jpeg(quality) => {
            let rgb = flatten_on_white(img);
            JpegEncoder::new_with_quality(&mut writer, quality.value() as u8)
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
        }
        Encoding::Png => img
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e))),
        Encoding::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut writer, ImageFormat::Gif)
            .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {}", e))),
    }?;

    writer.flush().map_err(BackendError::Io)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;

        let resized = if (img.width(), img.height()) == (params.width, params.height) {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        save_image(&resized, &params.output, params.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{write_jpeg, write_png};

    fn jpeg_params(source: &Path, output: &Path, width: u32, height: u32) -> ThumbnailParams {
        ThumbnailParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            width,
            height,
            encoding: Encoding::Jpeg(Quality::new(85)),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn thumbnail_jpeg_to_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_jpeg(&source, 1600, 1200);

        let output = tmp.path().join("thumb.jpg");
        let backend = RustBackend::new();
        backend
            .thumbnail(&jpeg_params(&source, &output, 800, 600))
            .unwrap();

        let (w, h) = image::image_dimensions(&output).unwrap();
        assert_eq!((w, h), (800, 600));
    }

    #[test]
    fn thumbnail_encoding_ignores_output_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_jpeg(&source, 100, 80);

        let output = tmp.path().join(".tmp-thumb");
        RustBackend::new()
            .thumbnail(&jpeg_params(&source, &output, 100, 80))
            .unwrap();

        let format = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn thumbnail_png_stays_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("scan.png");
        write_png(&source, 1000, 500);

        let output = tmp.path().join("thumb.png");
        RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 800,
                height: 400,
                encoding: Encoding::Png,
            })
            .unwrap();

        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (800, 400));
        assert!(img.color().has_alpha());
    }

    #[test]
    fn thumbnail_png_to_jpeg_flattens_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("clear.png");
        let transparent = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0]));
        transparent.save(&source).unwrap();

        let flat = flatten_on_white(&image::open(&source).unwrap());
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn thumbnail_gif_stays_gif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("anim.gif");
        image::RgbaImage::from_pixel(20, 10, image::Rgba([10, 200, 30, 255]))
            .save(&source)
            .unwrap();

        let output = tmp.path().join("thumb.gif");
        RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 20,
                height: 10,
                encoding: Encoding::Gif,
            })
            .unwrap();

        let (w, h) = image::image_dimensions(&output).unwrap();
        assert_eq!((w, h), (20, 10));
    }

    #[test]
    fn thumbnail_corrupt_source_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.jpg");
        std::fs::write(&source, b"\xff\xd8garbage").unwrap();

        let result =
            RustBackend::new().thumbnail(&jpeg_params(&source, &tmp.path().join("t.jpg"), 10, 10));
        assert!(result.is_err());
    }
}
