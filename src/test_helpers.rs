//! Shared test utilities for the seed-collage test suite.
//!
//! Provides a scripted [`RandomStream`] for forcing specific branches,
//! helpers that lay out tiny PNG asset trees in a temp directory, and a
//! small-canvas config that keeps full pipeline runs fast.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = asset_tree(&[("art", &["1.png", "2.png", "3.png"])]);
//! let config = small_config(&[("art", 1, 2)]);
//!
//! // first draw 0.9 is above the default stroke threshold → no strokes
//! let mut stream = ScriptedStream::new(vec![0.9]);
//! ```

use crate::config::{CategoryConfig, GeneratorConfig};
use crate::seed::RandomStream;
use image::{Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Scripted stream
// =========================================================================

/// A [`RandomStream`] that replays a fixed list of draws, cycling when it
/// runs out, and counts how many it handed out.
#[derive(Debug, Clone)]
pub struct ScriptedStream {
    values: Vec<f64>,
    consumed: usize,
}

impl ScriptedStream {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "scripted stream needs at least one value");
        Self {
            values,
            consumed: 0,
        }
    }

    /// Number of draws taken so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomStream for ScriptedStream {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.consumed % self.values.len()];
        self.consumed += 1;
        v
    }
}

// =========================================================================
// Asset fixtures
// =========================================================================

/// Write a solid-colour PNG asset.
pub fn write_png(path: &Path, size: (u32, u32), color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let [r, g, b] = color;
    RgbaImage::from_pixel(size.0, size.1, Rgba([r, g, b, 255]))
        .save(path)
        .unwrap();
}

/// Distinct colour per file so swapped files render differently.
fn fixture_color(category: &str, file: &str) -> [u8; 3] {
    let sum: u32 = category.bytes().chain(file.bytes()).map(u32::from).sum();
    [
        (sum * 37 % 256) as u8,
        (sum * 91 % 256) as u8,
        (sum * 53 % 256) as u8,
    ]
}

/// Create an asset root with one directory per category and a small PNG
/// for every listed file. Categories with no files get an empty directory.
pub fn asset_tree(categories: &[(&str, &[&str])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (category, files) in categories {
        let dir = tmp.path().join(category);
        std::fs::create_dir_all(&dir).unwrap();
        for file in *files {
            write_png(&dir.join(file), (12, 8), fixture_color(category, file));
        }
    }
    tmp
}

// =========================================================================
// Config
// =========================================================================

/// Stock config shrunk to a 64px canvas, with the given category table.
pub fn small_config(categories: &[(&str, u32, u32)]) -> GeneratorConfig {
    let mut config = GeneratorConfig::default();
    config.canvas.size = 64;
    config.canvas.frame_size = 72;
    config.categories = categories
        .iter()
        .map(|(name, min, factor)| CategoryConfig::new(name, *min, *factor))
        .collect();
    config.elements.min_size = 8.0;
    config.elements.max_size = 24.0;
    config.elements.placement_margin = 8;
    config.background.splash_min_radius = 2.0;
    config.background.splash_max_radius = 12.0;
    config.strokes.max_offset = 10.0;
    config.strokes.min_width = 1.0;
    config.strokes.max_width = 3.0;
    config.signature.width = 8;
    config.signature.margin = 2;
    config.output.format = crate::imaging::params::OutputFormat::Png;
    config.validate().unwrap();
    config
}

mod tests {
    use super::*;

    #[test]
    fn scripted_stream_cycles() {
        let mut s = ScriptedStream::new(vec![0.1, 0.2]);
        assert_eq!(s.next_f64(), 0.1);
        assert_eq!(s.next_f64(), 0.2);
        assert_eq!(s.next_f64(), 0.1);
        assert_eq!(s.consumed(), 3);
    }

    #[test]
    fn asset_tree_writes_decodable_pngs() {
        let tmp = asset_tree(&[("art", &["1.png"]), ("empty", &[])]);
        let img = image::open(tmp.path().join("art/1.png")).unwrap();
        assert_eq!((img.width(), img.height()), (12, 8));
        assert!(tmp.path().join("empty").is_dir());
    }
}
