//! Per-element colour effects applied to a resized asset before placement.
//!
//! Each function mutates an [`RgbaImage`] in place and leaves the alpha
//! channel alone. Grain noise is the only effect with its own randomness; it
//! draws from a child stream so the run's main stream is never touched while
//! painting.

use super::color::{Hsl, hsl_to_rgb, lerp_hsl, luma, normalize_hue, rgb_to_hsl};
use super::raster::{BlendMode, blend_color};
use crate::seed::RandomStream;
use image::RgbaImage;

/// Replace every pixel with its luma.
pub fn grayscale(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let v = luma([px[0], px[1], px[2]]);
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
}

/// Grayscale only the rectangle `[x0, x1) × [y0, y1)`, clipped to the image.
pub fn grayscale_patch(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) {
    let x1 = x1.min(img.width());
    let y1 = y1.min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let px = img.get_pixel_mut(x, y);
            let v = luma([px[0], px[1], px[2]]);
            px[0] = v;
            px[1] = v;
            px[2] = v;
        }
    }
}

/// Rotate hues by `degrees` and scale saturation by `1 + sat_delta / 100`.
/// Lightness is preserved.
pub fn hue_rotate(img: &mut RgbaImage, degrees: f64, sat_delta: f64) {
    let shift = normalize_hue(degrees) / 360.0;
    let sat_mod = 1.0 + sat_delta / 100.0;
    for px in img.pixels_mut() {
        let (h, s, l) = rgb_to_hsl([px[0], px[1], px[2]]);
        let [r, g, b] = hsl_to_rgb((h + shift).rem_euclid(1.0), (s * sat_mod).clamp(0.0, 1.0), l);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

/// Pull every pixel's hue and saturation toward `target` by `strength`
/// (0 = unchanged, 1 = fully the target hue). Lightness is preserved.
pub fn tint_toward(img: &mut RgbaImage, target: Hsl, strength: f64) {
    let strength = strength.clamp(0.0, 1.0);
    for px in img.pixels_mut() {
        let (h, s, l) = rgb_to_hsl([px[0], px[1], px[2]]);
        let from = Hsl::new(h * 360.0, s * 100.0, l * 100.0);
        let to = Hsl::new(target.h, target.s, from.l);
        let mixed = lerp_hsl(from, to, strength);
        let [r, g, b] = mixed.to_rgb();
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

/// Binary grain overlay.
///
/// Draws intensity `[0.3, 1.0)`, alpha `[0.15, 0.40)` and grain size
/// `1..=3` from `stream`, then one draw per grain cell in row-major order.
/// A cell is black or white by its draw and only painted when the draw is
/// below the intensity.
pub fn grain_noise(img: &mut RgbaImage, stream: &mut dyn RandomStream) {
    let intensity = stream.range(0.3, 1.0);
    let alpha = stream.range(0.15, 0.40);
    let grain = 1 + stream.index(3) as u32;

    let (w, h) = img.dimensions();
    let cells_x = w.div_ceil(grain);
    let cells_y = h.div_ceil(grain);
    for gy in 0..cells_y {
        for gx in 0..cells_x {
            let r = stream.next_f64();
            if r >= intensity {
                continue;
            }
            let value = if r > 0.5 { 255 } else { 0 };
            for y in gy * grain..((gy + 1) * grain).min(h) {
                for x in gx * grain..((gx + 1) * grain).min(w) {
                    let px = img.get_pixel_mut(x, y);
                    if px[3] == 0 {
                        continue;
                    }
                    blend_color(px, [value; 3], alpha, BlendMode::Overlay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeededStream;
    use crate::test_helpers::ScriptedStream;
    use image::Rgba;

    #[test]
    fn grayscale_equalizes_channels_and_keeps_alpha() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([200, 50, 10, 77]));
        grayscale(&mut img);
        let px = img.get_pixel(1, 1);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 77);
    }

    #[test]
    fn patch_only_touches_its_rect() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        grayscale_patch(&mut img, 0, 0, 2, 2);
        assert_eq!(img.get_pixel(0, 0).0, [77, 77, 77, 255]);
        assert_eq!(img.get_pixel(3, 3).0, [255, 0, 0, 255]);
    }

    #[test]
    fn patch_is_clipped() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        grayscale_patch(&mut img, 1, 1, 50, 50);
        assert_eq!(img.get_pixel(1, 1)[0], 77);
    }

    #[test]
    fn hue_rotate_red_to_green() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        hue_rotate(&mut img, 120.0, 0.0);
        assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn hue_rotate_full_circle_is_identity() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        hue_rotate(&mut img, 360.0, 0.0);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn full_tint_adopts_target_hue() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        tint_toward(&mut img, Hsl::new(240.0, 100.0, 20.0), 1.0);
        // lightness stays at 50%
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn zero_tint_is_identity() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([255, 128, 0, 255]));
        tint_toward(&mut img, Hsl::new(240.0, 100.0, 50.0), 0.0);
        assert_eq!(img.get_pixel(0, 0).0, [255, 128, 0, 255]);
    }

    #[test]
    fn noise_consumes_one_draw_per_cell() {
        // intensity, alpha, grain (index 0 → grain 1), then cells
        let mut stream = ScriptedStream::new(vec![0.0, 0.0, 0.0, 0.9]);
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([128, 128, 128, 255]));
        grain_noise(&mut img, &mut stream);
        assert_eq!(stream.consumed(), 3 + 12);
    }

    #[test]
    fn noise_cells_follow_grain_size() {
        // grain index draw 0.9 → grain 3; 4x3 image → 2x1 cells
        let mut stream = ScriptedStream::new(vec![0.0, 0.0, 0.9, 0.9]);
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([128, 128, 128, 255]));
        grain_noise(&mut img, &mut stream);
        assert_eq!(stream.consumed(), 3 + 2);
    }

    #[test]
    fn noise_is_reproducible_from_child_seed() {
        let base = RgbaImage::from_pixel(16, 16, Rgba([100, 150, 200, 255]));
        let mut a = base.clone();
        let mut b = base.clone();
        grain_noise(&mut a, &mut SeededStream::from_state(0.42));
        grain_noise(&mut b, &mut SeededStream::from_state(0.42));
        assert_eq!(a, b);
        assert_ne!(a, base);
    }

    #[test]
    fn noise_skips_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        grain_noise(&mut img, &mut SeededStream::from_state(0.1));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
