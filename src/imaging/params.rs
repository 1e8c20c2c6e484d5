//! Parameter types for decode/encode operations.
//!
//! These structs describe *what* to encode, not *how*. They are the interface
//! between the pipeline (which decides the output format) and the
//! [`backend`](super::backend) (which does the byte work), so a mock backend
//! can stand in during tests.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`OutputFormat`]: container of the generated image.
//! - [`EncodeParams`]: format + quality for one encode call.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

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
        Self(95)
    }
}

/// Encoded format of the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless WebP.
    Webp,
    Png,
    Jpeg,
}

impl OutputFormat {
    /// File extension written for this format (no dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

/// Parameters for encoding the final framed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
}
