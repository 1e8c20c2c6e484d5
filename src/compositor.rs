//! Collage composition in two phases.
//!
//! **Phase 1** ([`plan_composition`]) consumes the run's stream from start to
//! finish, in this fixed order:
//!
//! ```text
//! 0. warm-up            one discarded draw (the first draw is narrow, see crate::seed)
//! 1. base colour        hue [0, 360), saturation [30, 70), lightness [40, 70)
//! 2. palette            see crate::palette
//! 3. background         gradient kind, geometry, two stop picks,
//!                       splash count, per splash: x, y, radius, pick, alpha
//! 4. category shuffle   Fisher-Yates, n - 1 draws
//! 5. sampling           per category: count; per element: asset index,
//!                       center x, center y, transform plan
//! 6. strokes            see crate::strokes
//! ```
//!
//! **Phase 2** ([`render`]) paints from the resulting [`Composition`] and the
//! decoded sources. It never draws from a stream, so it can run after any
//! amount of parallel decoding without affecting the output.
//!
//! Painting order: background gradient, splashes, elements by descending area,
//! inset into the frame, strokes over the framed canvas, signature last.

use crate::catalog::{AssetCatalog, CatalogError};
use crate::config::{BackgroundConfig, GeneratorConfig, SignatureConfig};
use crate::imaging::calculations::{
    corner_position, fit_to_width, frame_inset, patch_rect, pixel_dimensions,
};
use crate::imaging::color::{Hsl, parse_hex_color};
use crate::imaging::effects;
use crate::imaging::raster::{
    BlendMode, CoverageMask, GradientShape, draw_transformed, fill_disc, fill_gradient,
    stamp_dashed_outline,
};
use crate::palette::{self, HarmonicPalette, SchemeType};
use crate::planner::{self, ColorFilter, DrawQueueItem, PlanContext, Sampling, TransformPlan};
use crate::seed::{RandomStream, SeededStream};
use crate::strokes::{self, StrokePlan};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const DASH_LENGTH: f64 = 12.0;
const DASH_GAP: f64 = 8.0;
const DASH_RADIUS: f64 = 1.5;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No decoded image for {}", .0.display())]
    MissingSource(PathBuf),
}

/// One translucent disc painted over the gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Splash {
    pub center: Point,
    pub radius: f64,
    pub color: Hsl,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundPlan {
    pub gradient: GradientShape,
    pub start: Hsl,
    pub end: Hsl,
    pub splashes: Vec<Splash>,
}

/// Everything phase 1 decided for one run.
#[derive(Debug, Clone)]
pub struct Composition {
    pub seed: String,
    pub palette: HarmonicPalette,
    pub background: BackgroundPlan,
    /// Draw queue in insertion order; [`render`] orders it by area.
    pub sampling: Sampling,
    pub strokes: StrokePlan,
    /// Total draws consumed by phase 1.
    pub draws: u64,
}

/// Final framed image plus everything metadata needs to describe it.
#[derive(Debug, Clone)]
pub struct CollageResult {
    pub image: RgbaImage,
    pub seed: String,
    pub stroke_count: u32,
    pub dashed_frame_count: u32,
    /// Occurrences per `"<Category> image #<label>"` key.
    pub selected_counts: BTreeMap<String, u32>,
    pub scheme: SchemeType,
}

/// Decoded source images keyed by asset path.
pub type SourceImages = HashMap<PathBuf, Arc<RgbaImage>>;

/// Draws discarded before the base colour.
const WARM_UP_DRAWS: usize = 1;

/// Phase 1: draw every randomized decision of the run.
pub fn plan_composition(
    seed: &str,
    config: &GeneratorConfig,
    catalog: &AssetCatalog,
) -> Result<Composition, CatalogError> {
    let mut stream = SeededStream::derive(seed);
    stream.skip(WARM_UP_DRAWS);

    let base = Hsl::new(
        stream.range(0.0, 360.0),
        stream.range(30.0, 70.0),
        stream.range(40.0, 70.0),
    );
    let palette = palette::generate(base, &mut stream, config.palette.max_hues);
    let background = plan_background(
        &mut stream,
        &palette,
        config.canvas.size,
        &config.background,
    );

    let ctx = PlanContext {
        elements: &config.elements,
        palette: &palette,
    };
    let sampling = planner::sample(
        catalog,
        &config.categories,
        config.canvas.size,
        &mut stream,
        &ctx,
    )?;
    let strokes = strokes::plan(&mut stream, &config.strokes, config.canvas.frame_size);

    debug!(
        seed,
        scheme = %palette.scheme,
        categories = ?sampling.category_order,
        elements = sampling.queue.len(),
        strokes = strokes.count(),
        draws = stream.position(),
        "planned composition"
    );

    Ok(Composition {
        seed: seed.to_string(),
        palette,
        background,
        sampling,
        strokes,
        draws: stream.position(),
    })
}

/// Draw the background gradient and splashes.
pub fn plan_background(
    stream: &mut dyn RandomStream,
    palette: &HarmonicPalette,
    canvas_size: u32,
    config: &BackgroundConfig,
) -> BackgroundPlan {
    let size = f64::from(canvas_size);
    let gradient = if stream.next_f64() < 0.5 {
        let from = Point::new(stream.next_f64() * size, stream.next_f64() * size);
        let to = Point::new(stream.next_f64() * size, stream.next_f64() * size);
        GradientShape::Linear { from, to }
    } else {
        let center = Point::new(stream.next_f64() * size, stream.next_f64() * size);
        let radius = stream.range(0.3, 1.0) * size;
        GradientShape::Radial { center, radius }
    };
    let start = palette.pick(stream);
    let end = palette.pick(stream).lighten(20.0);

    let span = config.splash_max.saturating_sub(config.splash_min) as usize + 1;
    let count = config.splash_min as usize + stream.index(span);
    let splashes = (0..count)
        .map(|_| {
            let center = Point::new(stream.next_f64() * size, stream.next_f64() * size);
            let radius = stream.range(config.splash_min_radius, config.splash_max_radius);
            let color = palette.pick(stream);
            let alpha = stream.range(0.1, 0.4);
            Splash {
                center,
                radius,
                color,
                alpha,
            }
        })
        .collect();

    BackgroundPlan {
        gradient,
        start,
        end,
        splashes,
    }
}

/// Paint gradient then splashes onto an opaque canvas.
pub fn paint_background(canvas: &mut RgbaImage, plan: &BackgroundPlan) {
    fill_gradient(canvas, plan.gradient, plan.start, plan.end);
    for splash in &plan.splashes {
        fill_disc(
            canvas,
            splash.center,
            splash.radius,
            splash.color.to_rgb(),
            splash.alpha,
        );
    }
}

/// Maps element bitmap pixels onto the canvas: centered on the plan's center,
/// rotated about it.
fn element_transform(plan: &TransformPlan, dims: (u32, u32)) -> Affine {
    let (w, h) = (f64::from(dims.0), f64::from(dims.1));
    Affine::translate(plan.center.to_vec2())
        * Affine::rotate(plan.rotation.to_radians())
        * Affine::translate((-w / 2.0, -h / 2.0))
}

/// Apply a plan's effects to a resized copy of `source` and paint it.
/// Returns whether a dashed frame was drawn.
pub fn render_element(canvas: &mut RgbaImage, plan: &TransformPlan, source: &RgbaImage) -> bool {
    let dims = pixel_dimensions(plan.width, plan.height);
    let mut bitmap = imageops::resize(source, dims.0, dims.1, FilterType::Triangle);

    match plan.filter {
        ColorFilter::Grayscale => effects::grayscale(&mut bitmap),
        ColorFilter::PaletteTint => {
            effects::tint_toward(&mut bitmap, plan.accent, 0.3 + 0.5 * plan.strength_a)
        }
        ColorFilter::None => {}
    }
    if plan.hue_shift {
        effects::hue_rotate(&mut bitmap, 30.0 + 300.0 * plan.strength_b, 0.0);
    }
    if plan.grayscale_patch {
        let (x0, y0, x1, y1) = patch_rect(dims, plan.strength_a, plan.strength_b);
        effects::grayscale_patch(&mut bitmap, x0, y0, x1, y1);
    }
    if plan.noise {
        effects::grain_noise(&mut bitmap, &mut SeededStream::from_state(plan.noise_seed));
    }

    let transform = element_transform(plan, dims);
    draw_transformed(canvas, &bitmap, transform, plan.alpha);

    if plan.dashed_frame {
        let (w, h) = (f64::from(dims.0), f64::from(dims.1));
        let corners = [
            transform * Point::new(0.0, 0.0),
            transform * Point::new(w, 0.0),
            transform * Point::new(w, h),
            transform * Point::new(0.0, h),
        ];
        let mut mask = CoverageMask::new(canvas.width(), canvas.height());
        stamp_dashed_outline(&mut mask, corners, DASH_LENGTH, DASH_GAP, DASH_RADIUS);
        mask.composite(
            canvas,
            plan.accent.lighten(-25.0).to_rgb(),
            0.9,
            BlendMode::Normal,
        );
    }
    plan.dashed_frame
}

/// Paint the queue in descending-area order. Returns the dashed frame count.
pub fn paint_queue(
    canvas: &mut RgbaImage,
    queue: &[DrawQueueItem],
    sources: &SourceImages,
) -> Result<u32, RenderError> {
    let mut ordered = queue.to_vec();
    planner::order_by_area(&mut ordered);

    let mut dashed = 0;
    for item in &ordered {
        let source = sources
            .get(&item.asset.path)
            .ok_or_else(|| RenderError::MissingSource(item.asset.path.clone()))?;
        if render_element(canvas, &item.plan, source) {
            dashed += 1;
        }
    }
    Ok(dashed)
}

/// Inset `canvas` into a square frame of `frame_size` filled with `color`.
pub fn frame(canvas: &RgbaImage, frame_size: u32, color: [u8; 3]) -> RgbaImage {
    let [r, g, b] = color;
    let mut framed = RgbaImage::from_pixel(frame_size, frame_size, Rgba([r, g, b, 255]));
    let inset = i64::from(frame_inset(canvas.width(), frame_size));
    imageops::replace(&mut framed, canvas, inset, inset);
    framed
}

/// Scale the signature to its configured width and blend it into the
/// bottom-right corner.
pub fn apply_signature(framed: &mut RgbaImage, signature: &RgbaImage, config: &SignatureConfig) {
    let dims = fit_to_width(signature.dimensions(), config.width);
    let scaled = imageops::resize(signature, dims.0, dims.1, FilterType::Triangle);
    let (x, y) = corner_position(framed.width(), dims, config.margin);
    let transform = Affine::translate((f64::from(x), f64::from(y)));
    draw_transformed(framed, &scaled, transform, config.opacity);
}

/// Phase 2: paint the composition.
pub fn render(
    composition: &Composition,
    sources: &SourceImages,
    signature: Option<&RgbaImage>,
    config: &GeneratorConfig,
) -> Result<CollageResult, RenderError> {
    let size = config.canvas.size;
    let mut canvas = RgbaImage::new(size, size);
    paint_background(&mut canvas, &composition.background);
    let dashed_frame_count = paint_queue(&mut canvas, &composition.sampling.queue, sources)?;

    let frame_color = parse_hex_color(&config.canvas.frame_color).unwrap_or([255, 255, 255]);
    let mut framed = frame(&canvas, config.canvas.frame_size, frame_color);
    let stroke_count = strokes::paint(&mut framed, &composition.strokes);
    if let Some(signature) = signature {
        apply_signature(&mut framed, signature, &config.signature);
    }

    Ok(CollageResult {
        image: framed,
        seed: composition.seed.clone(),
        stroke_count,
        dashed_frame_count,
        selected_counts: composition.sampling.selected_counts(),
        scheme: composition.palette.scheme,
    })
}
