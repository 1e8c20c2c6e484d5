//! CPU raster primitives on straight-alpha RGBA8 buffers.
//!
//! Just enough painting for the collage: gradient fills, soft discs,
//! affine-transformed image blits with bilinear sampling, and coverage masks
//! for strokes and dashed frames. All operations are pure functions of their
//! inputs, so identical plans always paint identical pixels.

use super::color::{Hsl, lerp_hsl};
use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point};

/// How a color is combined with the pixel underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source-over.
    Normal,
    /// Overlay: darkens darks and lightens lights, then mixed by alpha.
    Overlay,
}

/// Composite a premultiplied source (`rgb` in 0..255 scaled by `a`, `a` in 0..1)
/// over a straight-alpha destination pixel.
pub fn blend_premul(dst: &mut Rgba<u8>, premul: [f64; 3], a: f64) {
    if a <= 0.0 {
        return;
    }
    let a = a.min(1.0);
    let da = f64::from(dst[3]) / 255.0;
    let out_a = a + da * (1.0 - a);
    if out_a <= 0.0 {
        return;
    }
    for i in 0..3 {
        let dc = f64::from(dst[i]);
        let c = (premul[i] + dc * da * (1.0 - a)) / out_a;
        dst[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Blend a solid color into a pixel with the given mode and strength.
pub fn blend_color(dst: &mut Rgba<u8>, rgb: [u8; 3], alpha: f64, mode: BlendMode) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    match mode {
        BlendMode::Normal => {
            let premul = rgb.map(|c| f64::from(c) * alpha);
            blend_premul(dst, premul, alpha);
        }
        BlendMode::Overlay => {
            for i in 0..3 {
                let base = f64::from(dst[i]) / 255.0;
                let top = f64::from(rgb[i]) / 255.0;
                let mixed = overlay_channel(base, top);
                let out = base + (mixed - base) * alpha;
                dst[i] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Overlay blend of one normalized channel.
pub fn overlay_channel(base: f64, top: f64) -> f64 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

/// Geometry of a two-stop background gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientShape {
    Linear { from: Point, to: Point },
    Radial { center: Point, radius: f64 },
}

/// Fill the whole image with an opaque gradient interpolated in HSL.
pub fn fill_gradient(img: &mut RgbaImage, shape: GradientShape, start: Hsl, end: Hsl) {
    for (x, y, px) in img.enumerate_pixels_mut() {
        let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        let t = match shape {
            GradientShape::Linear { from, to } => {
                let d = to - from;
                let len2 = d.hypot2();
                if len2 <= f64::EPSILON {
                    0.0
                } else {
                    (p - from).dot(d) / len2
                }
            }
            GradientShape::Radial { center, radius } => {
                if radius <= 0.0 {
                    1.0
                } else {
                    (p - center).hypot() / radius
                }
            }
        };
        let [r, g, b] = lerp_hsl(start, end, t).to_rgb();
        *px = Rgba([r, g, b, 255]);
    }
}

/// Anti-aliased coverage of a pixel center at `dist` from a disc edge of `radius`.
fn disc_coverage(dist: f64, radius: f64) -> f64 {
    (radius + 0.5 - dist).clamp(0.0, 1.0)
}

/// Integer pixel range `[lo, hi)` covering `[min, max]`, clipped to `0..limit`.
fn clip_span(min: f64, max: f64, limit: u32) -> (u32, u32) {
    let lo = min.floor().max(0.0);
    let hi = (max.ceil() + 1.0).min(f64::from(limit));
    if hi <= lo {
        return (0, 0);
    }
    (lo as u32, hi as u32)
}

/// Fill a soft-edged disc with a translucent color.
pub fn fill_disc(img: &mut RgbaImage, center: Point, radius: f64, rgb: [u8; 3], alpha: f64) {
    let (x0, x1) = clip_span(center.x - radius - 1.0, center.x + radius + 1.0, img.width());
    let (y0, y1) = clip_span(center.y - radius - 1.0, center.y + radius + 1.0, img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let cov = disc_coverage((p - center).hypot(), radius);
            if cov > 0.0 {
                blend_color(img.get_pixel_mut(x, y), rgb, alpha * cov, BlendMode::Normal);
            }
        }
    }
}

/// Bilinear sample at continuous source coordinates (pixel centers at `i + 0.5`).
///
/// Returns premultiplied `[r, g, b]` and alpha in 0..1, or `None` outside the image.
pub fn sample_bilinear(src: &RgbaImage, u: f64, v: f64) -> Option<([f64; 3], f64)> {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 || u < 0.0 || v < 0.0 || u >= f64::from(w) || v >= f64::from(h) {
        return None;
    }
    let x = (u - 0.5).clamp(0.0, f64::from(w - 1));
    let y = (v - 0.5).clamp(0.0, f64::from(h - 1));
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - f64::from(x0);
    let fy = y - f64::from(y0);

    let mut rgb = [0.0; 3];
    let mut alpha = 0.0;
    for (px, py, weight) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ] {
        if weight <= 0.0 {
            continue;
        }
        let p = src.get_pixel(px, py);
        let a = f64::from(p[3]) / 255.0 * weight;
        for i in 0..3 {
            rgb[i] += f64::from(p[i]) * a;
        }
        alpha += a;
    }
    Some((rgb, alpha))
}

/// Paint `src` onto `dst` through `transform` (source pixel space → destination
/// pixel space) at the given opacity.
///
/// Only the transformed bounding box is visited; pixels are inverse-mapped
/// into the source and bilinearly sampled.
pub fn draw_transformed(dst: &mut RgbaImage, src: &RgbaImage, transform: Affine, opacity: f64) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src.width() == 0 || src.height() == 0 {
        return;
    }
    if transform.determinant().abs() <= f64::EPSILON {
        return;
    }
    let (sw, sh) = (f64::from(src.width()), f64::from(src.height()));
    let corners = [
        transform * Point::new(0.0, 0.0),
        transform * Point::new(sw, 0.0),
        transform * Point::new(0.0, sh),
        transform * Point::new(sw, sh),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let (x0, x1) = clip_span(min_x, max_x, dst.width());
    let (y0, y1) = clip_span(min_y, max_y, dst.height());

    let inverse = transform.inverse();
    for y in y0..y1 {
        for x in x0..x1 {
            let p = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if let Some((rgb, a)) = sample_bilinear(src, p.x, p.y) {
                let premul = rgb.map(|c| c * opacity);
                blend_premul(dst.get_pixel_mut(x, y), premul, a * opacity);
            }
        }
    }
}

/// Per-pixel coverage accumulated from stamped discs.
///
/// Overlapping stamps take the maximum coverage rather than summing, so a
/// stroke composites as one shape instead of darkening where stamps overlap.
#[derive(Debug, Clone)]
pub struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|c| *c <= 0.0)
    }

    /// Stamp a disc of `radius` centered at `center`.
    pub fn stamp_disc(&mut self, center: Point, radius: f64) {
        let (x0, x1) = clip_span(center.x - radius - 1.0, center.x + radius + 1.0, self.width);
        let (y0, y1) = clip_span(center.y - radius - 1.0, center.y + radius + 1.0, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let cov = disc_coverage((p - center).hypot(), radius) as f32;
                let idx = y as usize * self.width as usize + x as usize;
                if cov > self.data[idx] {
                    self.data[idx] = cov;
                }
            }
        }
    }

    /// Stamp discs along a straight segment, one per pixel of length.
    pub fn stamp_segment(&mut self, from: Point, to: Point, radius: f64) {
        let steps = (to - from).hypot().ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            self.stamp_disc(from.lerp(to, t), radius);
        }
    }

    /// Composite a solid color through this mask.
    pub fn composite(&self, img: &mut RgbaImage, rgb: [u8; 3], alpha: f64, mode: BlendMode) {
        let w = self.width.min(img.width());
        let h = self.height.min(img.height());
        for y in 0..h {
            for x in 0..w {
                let cov = f64::from(self.coverage(x, y));
                if cov > 0.0 {
                    blend_color(img.get_pixel_mut(x, y), rgb, alpha * cov, mode);
                }
            }
        }
    }
}

/// Stamp a dashed outline of the quadrilateral `corners` (in drawing order).
pub fn stamp_dashed_outline(
    mask: &mut CoverageMask,
    corners: [Point; 4],
    dash: f64,
    gap: f64,
    radius: f64,
) {
    let period = dash + gap;
    let mut travelled = 0.0;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let len = (b - a).hypot();
        let steps = len.ceil().max(1.0) as u32;
        for s in 0..steps {
            let t0 = f64::from(s) / f64::from(steps);
            let t1 = f64::from(s + 1) / f64::from(steps);
            let phase = (travelled + len * t0) % period;
            if phase < dash {
                mask.stamp_segment(a.lerp(b, t0), a.lerp(b, t1), radius);
            }
        }
        travelled += len;
    }
}
