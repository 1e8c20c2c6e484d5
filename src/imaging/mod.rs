//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (PNG, JPEG, WebP) |
//! | **Resize** | `image::imageops::resize` (triangle filter) |
//! | **Place** | [`raster::draw_transformed`] with a `kurbo::Affine` |
//! | **Strokes / frames** | [`raster::CoverageMask`] |
//! | **Encode** | lossless WebP, PNG, JPEG with quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing encode operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Color / Raster / Effects**: pixel-level painting used by the compositor

pub mod backend;
pub mod calculations;
pub mod color;
pub mod effects;
pub mod params;
pub mod raster;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use params::{EncodeParams, OutputFormat, Quality};
pub use rust_backend::RustBackend;
