//! Generator configuration.
//!
//! Every tunable of the pipeline lives here: category sampling table, element
//! size ranges, effect probabilities, stroke thresholds, palette bound, output
//! encoding and metadata text. Historical generator variants differ only in
//! these values, so a variant is a config file, not a code path.
//!
//! ## Config File Location
//!
//! `collage.toml` in the asset root is picked up automatically; `--config`
//! points at an explicit file instead:
//!
//! ```text
//! images/
//! ├── collage.toml          # Optional, overrides stock defaults
//! ├── signature.png         # Optional signature overlay
//! ├── food/
//! │   ├── 1.png
//! │   └── 2.png
//! └── clown/
//!     └── 1.webp
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables are merged key by key over the stock
//! defaults; arrays (like `[[categories]]`) replace the default wholesale:
//!
//! ```toml
//! [strokes]
//! threshold = 0.5
//!
//! [[categories]]
//! name = "art"
//! min = 1
//! factor = 2
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::color::parse_hex_color;
use crate::imaging::params::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the asset root when no explicit config is given.
pub const CONFIG_FILENAME: &str = "collage.toml";

/// Upper bound on palette size, regardless of configuration.
pub const MAX_PALETTE_HUES: usize = 6;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub canvas: CanvasConfig,
    /// Category sampling table, in configuration order (the run shuffles it).
    pub categories: Vec<CategoryConfig>,
    pub elements: ElementsConfig,
    pub background: BackgroundConfig,
    pub palette: PaletteConfig,
    pub strokes: StrokesConfig,
    pub signature: SignatureConfig,
    pub output: OutputConfig,
    pub metadata: MetadataConfig,
    pub processing: ProcessingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            categories: default_categories(),
            elements: ElementsConfig::default(),
            background: BackgroundConfig::default(),
            palette: PaletteConfig::default(),
            strokes: StrokesConfig::default(),
            signature: SignatureConfig::default(),
            output: OutputConfig::default(),
            metadata: MetadataConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.canvas.size == 0 {
            return invalid("canvas.size must be positive");
        }
        if self.canvas.frame_size < self.canvas.size {
            return invalid("canvas.frame_size must be at least canvas.size");
        }
        if parse_hex_color(&self.canvas.frame_color).is_none() {
            return Err(ConfigError::Validation(format!(
                "canvas.frame_color is not a #rrggbb color: {}",
                self.canvas.frame_color
            )));
        }

        if self.categories.is_empty() {
            return invalid("at least one category must be configured");
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return invalid("category names must not be empty");
            }
            if !seen.insert(category.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category: {}",
                    category.name
                )));
            }
            if category.factor == 0 {
                return Err(ConfigError::Validation(format!(
                    "category {} must have factor >= 1",
                    category.name
                )));
            }
        }

        let e = &self.elements;
        if e.min_size <= 0.0 || e.max_size < e.min_size {
            return invalid("elements.min_size must be positive and <= max_size");
        }
        if e.max_deformation < 0.0 {
            return invalid("elements.max_deformation must not be negative");
        }
        if !(0.0..=1.0).contains(&e.alpha_min)
            || !(0.0..=1.0).contains(&e.alpha_max)
            || e.alpha_max < e.alpha_min
        {
            return invalid("elements.alpha_min/alpha_max must satisfy 0 <= min <= max <= 1");
        }
        if e.placement_margin >= self.canvas.size {
            return invalid("elements.placement_margin must be smaller than canvas.size");
        }
        for (name, p) in [
            ("grayscale_patch_chance", e.grayscale_patch_chance),
            ("noise_chance", e.noise_chance),
            ("dashed_frame_chance", e.dashed_frame_chance),
            ("hue_shift_chance", e.hue_shift_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Validation(format!(
                    "elements.{name} must be within 0-1"
                )));
            }
        }

        let b = &self.background;
        if b.splash_max < b.splash_min {
            return invalid("background.splash_max must be >= splash_min");
        }
        if b.splash_min_radius <= 0.0 || b.splash_max_radius < b.splash_min_radius {
            return invalid("background splash radii must be positive and ordered");
        }

        if self.palette.max_hues == 0 || self.palette.max_hues > MAX_PALETTE_HUES {
            return Err(ConfigError::Validation(format!(
                "palette.max_hues must be 1-{MAX_PALETTE_HUES}"
            )));
        }

        let s = &self.strokes;
        if !(0.0..=1.0).contains(&s.threshold) {
            return invalid("strokes.threshold must be within 0-1");
        }
        if s.min_segments == 0 || s.max_segments < s.min_segments {
            return invalid("strokes.min_segments must be positive and <= max_segments");
        }
        if s.min_width <= 0.0 || s.max_width < s.min_width {
            return invalid("strokes.min_width must be positive and <= max_width");
        }

        if !(0.0..=1.0).contains(&self.signature.opacity) {
            return invalid("signature.opacity must be within 0-1");
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return invalid("output.quality must be 1-100");
        }
        Ok(())
    }

    /// Look up the sampling parameters of a category by name.
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// Working canvas and the framed output canvas around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    /// Edge length of the square working canvas the collage is painted on.
    pub size: u32,
    /// Edge length of the final image; the difference is a uniform border.
    pub frame_size: u32,
    /// Border color as `#rrggbb`.
    pub frame_color: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            frame_size: 1024,
            frame_color: "#ffffff".to_string(),
        }
    }
}

/// One named bucket of source images and how many instances a run samples.
///
/// The sampled count is `min + floor(draw * factor)`, i.e. within
/// `[min, min + factor)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: String,
    pub min: u32,
    pub factor: u32,
}

impl CategoryConfig {
    pub fn new(name: &str, min: u32, factor: u32) -> Self {
        Self {
            name: name.to_string(),
            min,
            factor,
        }
    }
}

fn default_categories() -> Vec<CategoryConfig> {
    [
        "food",
        "clown",
        "childrendrawings",
        "surgery",
        "architecture",
        "tools",
        "graffiti",
        "insect",
        "painting",
        "flowers",
    ]
    .into_iter()
    .map(|name| CategoryConfig::new(name, 1, 2))
    .collect()
}

/// Per-element transform ranges and effect probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementsConfig {
    pub min_size: f64,
    pub max_size: f64,
    /// Deformation draw is scaled by this before stretching an axis.
    pub max_deformation: f64,
    pub alpha_min: f64,
    pub alpha_max: f64,
    /// Centers are drawn within `[0, canvas.size - placement_margin)` on each axis.
    pub placement_margin: u32,
    pub grayscale_patch_chance: f64,
    pub noise_chance: f64,
    pub dashed_frame_chance: f64,
    pub hue_shift_chance: f64,
}

impl Default for ElementsConfig {
    fn default() -> Self {
        Self {
            min_size: 200.0,
            max_size: 800.0,
            max_deformation: 1.0,
            alpha_min: 0.7,
            alpha_max: 1.0,
            placement_margin: 200,
            grayscale_patch_chance: 0.15,
            noise_chance: 0.2,
            dashed_frame_chance: 0.12,
            hue_shift_chance: 0.25,
        }
    }
}

/// Background gradient and splash settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    pub splash_min: u32,
    pub splash_max: u32,
    pub splash_min_radius: f64,
    pub splash_max_radius: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            splash_min: 5,
            splash_max: 15,
            splash_min_radius: 20.0,
            splash_max_radius: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteConfig {
    /// Cap on distinct palette hues (1-6).
    pub max_hues: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            max_hues: MAX_PALETTE_HUES,
        }
    }
}

/// Decorative stroke overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrokesConfig {
    /// Strokes are drawn only when the first stroke draw is `<= threshold`.
    pub threshold: f64,
    pub max_strokes: u32,
    pub min_segments: u32,
    pub max_segments: u32,
    /// Largest per-axis distance of a control point from the previous point.
    pub max_offset: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl Default for StrokesConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            max_strokes: 12,
            min_segments: 10,
            max_segments: 25,
            max_offset: 150.0,
            min_width: 2.0,
            max_width: 12.0,
        }
    }
}

/// Signature overlay placed in the bottom-right corner of the framed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignatureConfig {
    /// Path relative to the asset root. No overlay when absent.
    pub path: Option<PathBuf>,
    pub opacity: f64,
    /// Target width in pixels; height follows the asset's aspect ratio.
    pub width: u32,
    pub margin: u32,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            path: None,
            opacity: 0.5,
            width: 96,
            margin: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Lossy quality (1-100). Only JPEG is lossy; PNG and WebP are lossless.
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            quality: 95,
        }
    }
}

/// Static text written into every metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Instance name is `"{name_prefix} #{n}"`.
    pub name_prefix: String,
    pub description: String,
    pub external_url: String,
    /// Prepended to `"{n}.{ext}"` for the `image` field (e.g. an `ipfs://<cid>/` root).
    pub image_base_uri: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name_prefix: "Attentionless".to_string(),
            description: "Attentionless is a collection of generative collages of CC0 images."
                .to_string(),
            external_url: String::new(),
            image_base_uri: String::new(),
        }
    }
}

/// Parallel decoding settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GeneratorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicit config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `collage.toml` from a directory, falling back to stock defaults
/// when the file does not exist.
pub fn load_config(dir: &Path) -> Result<GeneratorConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `collage.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Collage Generator Configuration
# ===============================
# All settings are optional. Values shown below are the defaults.
# Tables merge key by key over these defaults; [[categories]] replaces the
# whole table when present. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Canvas
# ---------------------------------------------------------------------------
[canvas]
# Square working canvas the collage is painted on.
size = 1000
# Final image size; the difference becomes a uniform border.
frame_size = 1024
frame_color = "#ffffff"

# ---------------------------------------------------------------------------
# Elements: transform ranges and effect probabilities
# ---------------------------------------------------------------------------
[elements]
min_size = 200.0
max_size = 800.0
max_deformation = 1.0
alpha_min = 0.7
alpha_max = 1.0
# Half of this margin is kept clear of element centers on each canvas edge.
placement_margin = 200
grayscale_patch_chance = 0.15
noise_chance = 0.2
dashed_frame_chance = 0.12
hue_shift_chance = 0.25

# ---------------------------------------------------------------------------
# Background splashes
# ---------------------------------------------------------------------------
[background]
splash_min = 5
splash_max = 15
splash_min_radius = 20.0
splash_max_radius = 200.0

# ---------------------------------------------------------------------------
# Harmonic palette
# ---------------------------------------------------------------------------
[palette]
# Distinct hues kept per palette (1-6).
max_hues = 6

# ---------------------------------------------------------------------------
# Decorative strokes
# ---------------------------------------------------------------------------
[strokes]
# Strokes are drawn only when the first stroke draw is <= threshold.
threshold = 0.8
max_strokes = 12
min_segments = 10
max_segments = 25
max_offset = 150.0
# Stroke width range in pixels.
min_width = 2.0
max_width = 12.0

# ---------------------------------------------------------------------------
# Signature overlay (bottom-right corner)
# ---------------------------------------------------------------------------
[signature]
# Path relative to the asset root. Omit for no signature.
# path = "signature.png"
opacity = 0.5
width = 96
margin = 20

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# One of "webp" (lossless), "png", "jpeg".
format = "webp"
# JPEG quality (1-100).
quality = 95

# ---------------------------------------------------------------------------
# Metadata text
# ---------------------------------------------------------------------------
[metadata]
name_prefix = "Attentionless"
description = "Attentionless is a collection of generative collages of CC0 images."
external_url = ""
image_base_uri = ""

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decode workers. Omit to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Categories: one subdirectory of the asset root each.
# Each run samples [min, min + factor) images per category.
# ---------------------------------------------------------------------------
[[categories]]
name = "food"
min = 1
factor = 2

[[categories]]
name = "clown"
min = 1
factor = 2

[[categories]]
name = "childrendrawings"
min = 1
factor = 2

[[categories]]
name = "surgery"
min = 1
factor = 2

[[categories]]
name = "architecture"
min = 1
factor = 2

[[categories]]
name = "tools"
min = 1
factor = 2

[[categories]]
name = "graffiti"
min = 1
factor = 2

[[categories]]
name = "insect"
min = 1
factor = 2

[[categories]]
name = "painting"
min = 1
factor = 2

[[categories]]
name = "flowers"
min = 1
factor = 2
"##
}
