//! Trait metadata derived from a finished collage.
//!
//! Metadata is a pure function of the [`CollageResult`]: nothing here draws
//! from the stream or inspects pixels, so the traits always describe exactly
//! what the compositor recorded.
//!
//! ## Document shape
//!
//! ```json
//! {
//!   "name": "Attentionless #7",
//!   "description": "...",
//!   "image": "ipfs://<cid>/7.webp",
//!   "external_url": "",
//!   "seed": "9f2c...",
//!   "attributes": [
//!     { "trait_type": "Food image #3", "value": 1 },
//!     { "trait_type": "Number of images", "value": 12 },
//!     { "trait_type": "Number of strokes", "value": 4 },
//!     { "trait_type": "Number of dashed frames", "value": 1 },
//!     { "trait_type": "Harmonic scheme", "value": "Triad" }
//!   ]
//! }
//! ```
//!
//! ## Attribute order
//!
//! One attribute per distinct selected image, sorted by trait key, followed by
//! the four summary traits in the fixed order above.

use crate::compositor::CollageResult;
use crate::config::MetadataConfig;
use serde::{Deserialize, Serialize};

pub const TRAIT_IMAGE_COUNT: &str = "Number of images";
pub const TRAIT_STROKE_COUNT: &str = "Number of strokes";
pub const TRAIT_DASHED_FRAMES: &str = "Number of dashed frames";
pub const TRAIT_SCHEME: &str = "Harmonic scheme";

/// A trait value: counts serialize as JSON numbers, labels as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub trait_type: String,
    pub value: TraitValue,
}

impl Trait {
    fn number(trait_type: &str, value: u64) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: TraitValue::Number(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub external_url: String,
    pub seed: String,
    pub attributes: Vec<Trait>,
}

impl Metadata {
    /// Look up an attribute value by trait type.
    pub fn attribute(&self, trait_type: &str) -> Option<&TraitValue> {
        self.attributes
            .iter()
            .find(|t| t.trait_type == trait_type)
            .map(|t| &t.value)
    }
}

/// Per-instance naming inputs.
#[derive(Debug, Clone, Copy)]
pub struct MetadataContext<'a> {
    /// 1-based instance number.
    pub instance: u32,
    /// Extension of the written image file (no dot).
    pub extension: &'a str,
    pub config: &'a MetadataConfig,
}

/// Build the metadata document for one collage.
pub fn derive(result: &CollageResult, ctx: &MetadataContext<'_>) -> Metadata {
    let mut attributes: Vec<Trait> = result
        .selected_counts
        .iter()
        .map(|(key, count)| Trait::number(key, u64::from(*count)))
        .collect();

    let total: u64 = result.selected_counts.values().map(|c| u64::from(*c)).sum();
    attributes.push(Trait::number(TRAIT_IMAGE_COUNT, total));
    attributes.push(Trait::number(TRAIT_STROKE_COUNT, u64::from(result.stroke_count)));
    attributes.push(Trait::number(
        TRAIT_DASHED_FRAMES,
        u64::from(result.dashed_frame_count),
    ));
    attributes.push(Trait {
        trait_type: TRAIT_SCHEME.to_string(),
        value: TraitValue::Text(result.scheme.to_string()),
    });

    Metadata {
        name: format!("{} #{}", ctx.config.name_prefix, ctx.instance),
        description: ctx.config.description.clone(),
        image: format!(
            "{}{}.{}",
            ctx.config.image_base_uri, ctx.instance, ctx.extension
        ),
        external_url: ctx.config.external_url.clone(),
        seed: result.seed.clone(),
        attributes,
    }
}
