//! Image codec backend trait and shared error type.
//!
//! The [`ImageBackend`] trait is the seam between the deterministic pipeline
//! and raster codecs: decode a source asset into RGBA pixels, encode the final
//! canvas into bytes. Everything in between (planning, compositing, strokes)
//! works on in-memory [`RgbaImage`]s and never touches a codec.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), backed by the `image`
//! crate.

use super::params::EncodeParams;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image codec backends.
///
/// `Sync` so decodes can fan out across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode an asset into 8-bit RGBA.
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Encode a finished canvas into the configured output format.
    fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}
