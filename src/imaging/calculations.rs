//! Pure geometry for elements, frame and signature.
//!
//! All functions here are pure and testable without any I/O or images.

/// Width of the uniform border around the inset canvas.
///
/// ```text
/// frame_inset(1000, 1024) == 12
/// ```
pub fn frame_inset(canvas_size: u32, frame_size: u32) -> u32 {
    frame_size.saturating_sub(canvas_size) / 2
}

/// Range `[lo, hi)` for element centers along one axis.
///
/// Half the margin is kept clear on each side so no center sits on the edge.
pub fn placement_bounds(canvas_size: u32, margin: u32) -> (f64, f64) {
    let margin = margin.min(canvas_size);
    let lo = f64::from(margin) / 2.0;
    (lo, f64::from(canvas_size) - lo)
}

/// Resolved element size before rotation.
///
/// `size` is the base edge; each axis flagged for expansion grows by
/// `size * deformation`.
///
/// # Arguments
/// * `size` - Base edge length in pixels
/// * `deformation` - Stretch factor, `0` keeps the element square
/// * `expand_w` / `expand_h` - Which axes receive the stretch
///
/// # Returns
/// * `(width, height)` in fractional pixels
pub fn element_dimensions(size: f64, deformation: f64, expand_w: bool, expand_h: bool) -> (f64, f64) {
    let stretch = size * deformation;
    let w = if expand_w { size + stretch } else { size };
    let h = if expand_h { size + stretch } else { size };
    (w, h)
}

/// Round fractional dimensions to a drawable bitmap size (at least 1x1).
pub fn pixel_dimensions(width: f64, height: f64) -> (u32, u32) {
    let round = |v: f64| (v.round().max(1.0)) as u32;
    (round(width), round(height))
}

/// Centered grayscale patch inside a `(w, h)` bitmap as `(x0, y0, x1, y1)`.
///
/// The patch spans between a quarter and three quarters of each axis,
/// scaled by the two strength values.
pub fn patch_rect(dims: (u32, u32), strength_a: f64, strength_b: f64) -> (u32, u32, u32, u32) {
    let (w, h) = dims;
    let pw = (f64::from(w) * (0.25 + 0.5 * strength_a.clamp(0.0, 1.0))).round() as u32;
    let ph = (f64::from(h) * (0.25 + 0.5 * strength_b.clamp(0.0, 1.0))).round() as u32;
    let x0 = (w - pw.min(w)) / 2;
    let y0 = (h - ph.min(h)) / 2;
    (x0, y0, x0 + pw.min(w), y0 + ph.min(h))
}

/// Scale `source` to `target_width`, preserving aspect ratio.
pub fn fit_to_width(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (target_width.max(1), 1);
    }
    let h = (f64::from(src_h) * f64::from(target_width) / f64::from(src_w)).round();
    (target_width.max(1), (h as u32).max(1))
}

/// Top-left position of a `dims` overlay in the bottom-right corner of a
/// square frame, inset by `margin`. Clamped to the frame origin.
pub fn corner_position(frame_size: u32, dims: (u32, u32), margin: u32) -> (u32, u32) {
    let x = frame_size.saturating_sub(dims.0).saturating_sub(margin);
    let y = frame_size.saturating_sub(dims.1).saturating_sub(margin);
    (x, y)
}
