//! Per-element transform planning and category sampling.
//!
//! Planning is phase 1 of a run: every value an element needs (size,
//! rotation, effects, colours, even the seed of its grain noise) is drawn here
//! and frozen into an immutable [`TransformPlan`]. Painting reads the plan
//! and never touches the stream, so decode timing and painting order cannot
//! influence the result.
//!
//! ## Draw order per element
//!
//! After the caller draws the element's asset index and center, [`plan`]
//! consumes exactly [`DRAWS_PER_PLAN`] draws:
//!
//! ```text
//!  1 size            [min_size, max_size)
//!  2 rotation        draw * 360 degrees
//!  3 deformation     [0, max_deformation)
//!  4 effect selector < 1/3 grayscale, < 2/3 palette tint, else none
//!  5 expand width    < 0.5
//!  6 expand height   < 0.5
//!  7 alpha           [alpha_min, alpha_max)
//!  8 strength a
//!  9 strength b
//! 10 grayscale patch < grayscale_patch_chance
//! 11 grain noise     < noise_chance
//! 12 dashed frame    < dashed_frame_chance
//! 13 hue shift       < hue_shift_chance
//! 14 accent colour   palette pick
//! 15 noise seed      child stream state
//! ```

use crate::catalog::{AssetCatalog, CatalogError, ImageAsset};
use crate::config::{CategoryConfig, ElementsConfig};
use crate::imaging::calculations::{element_dimensions, placement_bounds};
use crate::imaging::color::Hsl;
use crate::palette::HarmonicPalette;
use crate::seed::{RandomStream, shuffle};
use kurbo::Point;
use std::collections::BTreeMap;
use tracing::debug;

/// Draws consumed by one call to [`plan`].
pub const DRAWS_PER_PLAN: usize = 15;

/// Whole-element colour treatment chosen by the effect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFilter {
    Grayscale,
    PaletteTint,
    None,
}

impl ColorFilter {
    fn from_draw(v: f64) -> Self {
        if v < 1.0 / 3.0 {
            Self::Grayscale
        } else if v < 2.0 / 3.0 {
            Self::PaletteTint
        } else {
            Self::None
        }
    }
}

/// Everything needed to paint one element, frozen at sampling time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    pub center: Point,
    pub size: f64,
    /// Degrees, clockwise in image space.
    pub rotation: f64,
    pub deformation: f64,
    pub filter: ColorFilter,
    pub expand_width: bool,
    pub expand_height: bool,
    pub alpha: f64,
    pub strength_a: f64,
    pub strength_b: f64,
    pub grayscale_patch: bool,
    pub noise: bool,
    pub dashed_frame: bool,
    pub hue_shift: bool,
    /// Palette colour for tinting and the dashed frame.
    pub accent: Hsl,
    /// Initial state of the grain-noise child stream.
    pub noise_seed: f64,
    pub width: f64,
    pub height: f64,
    /// `width * height`, used only for draw ordering.
    pub area: f64,
}

/// One element waiting to be painted.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawQueueItem {
    pub plan: TransformPlan,
    pub asset: ImageAsset,
}

/// Inputs shared by every plan of a run.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub elements: &'a ElementsConfig,
    pub palette: &'a HarmonicPalette,
}

/// Draw the transform plan of one element.
pub fn plan(
    asset: &ImageAsset,
    stream: &mut dyn RandomStream,
    center: Point,
    ctx: &PlanContext<'_>,
) -> DrawQueueItem {
    let e = ctx.elements;
    let size = stream.range(e.min_size, e.max_size);
    let rotation = stream.next_f64() * 360.0;
    let deformation = stream.range(0.0, e.max_deformation);
    let filter = ColorFilter::from_draw(stream.next_f64());
    let expand_width = stream.chance(0.5);
    let expand_height = stream.chance(0.5);
    let alpha = stream.range(e.alpha_min, e.alpha_max);
    let strength_a = stream.next_f64();
    let strength_b = stream.next_f64();
    let grayscale_patch = stream.chance(e.grayscale_patch_chance);
    let noise = stream.chance(e.noise_chance);
    let dashed_frame = stream.chance(e.dashed_frame_chance);
    let hue_shift = stream.chance(e.hue_shift_chance);
    let accent = ctx.palette.pick(stream);
    let noise_seed = stream.next_f64();

    let (width, height) = element_dimensions(size, deformation, expand_width, expand_height);

    DrawQueueItem {
        plan: TransformPlan {
            center,
            size,
            rotation,
            deformation,
            filter,
            expand_width,
            expand_height,
            alpha,
            strength_a,
            strength_b,
            grayscale_patch,
            noise,
            dashed_frame,
            hue_shift,
            accent,
            noise_seed,
            width,
            height,
            area: width * height,
        },
        asset: asset.clone(),
    }
}

/// Stable sort by descending area: larger elements are painted first so
/// smaller ones stay visible on top. Equal areas keep insertion order.
pub fn order_by_area(items: &mut [DrawQueueItem]) {
    items.sort_by(|a, b| b.plan.area.total_cmp(&a.plan.area));
}

/// Result of the sampling loop, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Sampling {
    pub queue: Vec<DrawQueueItem>,
    /// Processing order of the categories after the shuffle.
    pub category_order: Vec<String>,
}

impl Sampling {
    /// Occurrences per trait key (`"Food image #3"`), sorted by key.
    pub fn selected_counts(&self) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for item in &self.queue {
            *counts.entry(item.asset.trait_key()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of sampled elements per category.
    pub fn category_counts(&self) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for item in &self.queue {
            *counts.entry(item.asset.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Shuffle the categories, then sample and plan every element.
///
/// Per category (in shuffled order): one count draw giving
/// `min + floor(draw * factor)`; per instance: asset index, center x,
/// center y, then the [`plan`] draws.
pub fn sample(
    catalog: &AssetCatalog,
    categories: &[CategoryConfig],
    canvas_size: u32,
    stream: &mut dyn RandomStream,
    ctx: &PlanContext<'_>,
) -> Result<Sampling, CatalogError> {
    let mut order: Vec<&CategoryConfig> = categories.iter().collect();
    shuffle(&mut order, stream);

    let (lo, hi) = placement_bounds(canvas_size, ctx.elements.placement_margin);
    let mut sampling = Sampling::default();
    for category in order {
        let assets = catalog.list(&category.name)?;
        let count = category.min + (stream.next_f64() * f64::from(category.factor)).floor() as u32;
        debug!(category = %category.name, count, "sampling category");
        for _ in 0..count {
            let asset = &assets[stream.index(assets.len())];
            let center = Point::new(stream.range(lo, hi), stream.range(lo, hi));
            let item = plan(asset, stream, center, ctx);
            debug!(
                asset = %asset.file_name,
                size = item.plan.size,
                rotation = item.plan.rotation,
                area = item.plan.area,
                "planned element"
            );
            sampling.queue.push(item);
        }
        sampling.category_order.push(category.name.clone());
    }
    Ok(sampling)
}
