//! Pure Rust codec backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image::ImageReader` with content sniffing |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeParams, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::path::Path;

/// Extensions whose decoders are compiled in.
const INPUT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Returns the set of asset file extensions the catalog accepts.
pub fn supported_input_extensions() -> &'static [&'static str] {
    INPUT_EXTENSIONS
}

/// Whether `path` has a decodable extension (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            INPUT_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let reader = ImageReader::open(path)
            .map_err(|e| decode_error(path, e))?
            .with_guessed_format()
            .map_err(|e| decode_error(path, e))?;
        let img = reader.decode().map_err(|e| decode_error(path, e))?;
        Ok(img.to_rgba8())
    }

    fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        let result = match params.format {
            OutputFormat::Webp => DynamicImage::ImageRgba8(image.clone())
                .write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
            OutputFormat::Png => DynamicImage::ImageRgba8(image.clone())
                .write_with_encoder(PngEncoder::new(&mut buf)),
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                let quality = params.quality.value() as u8;
                DynamicImage::ImageRgb8(rgb)
                    .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
            }
        };
        result.map_err(|e| {
            BackendError::Encode(format!("{} encode failed: {}", params.format.extension(), e))
        })?;
        Ok(buf)
    }
}
