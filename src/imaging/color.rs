//! Color math: HSL ⇄ RGB, hue arithmetic, hex parsing.
//!
//! HSL values use the units the palette is specified in: hue in degrees
//! `[0, 360)`, saturation and lightness in percent `[0, 100]`.

/// A color in HSL space (degrees, percent, percent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Self {
            h: normalize_hue(h),
            s: s.clamp(0.0, 100.0),
            l: l.clamp(0.0, 100.0),
        }
    }

    /// Same hue and saturation with lightness shifted by `delta` percent.
    pub fn lighten(self, delta: f64) -> Self {
        Self::new(self.h, self.s, self.l + delta)
    }

    pub fn to_rgb(self) -> [u8; 3] {
        hsl_to_rgb(self.h / 360.0, self.s / 100.0, self.l / 100.0)
    }
}

/// Wrap a hue in degrees into `[0, 360)`.
pub fn normalize_hue(h: f64) -> f64 {
    let wrapped = h.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Interpolate two HSL colors, taking the shorter way around the hue circle.
pub fn lerp_hsl(a: Hsl, b: Hsl, t: f64) -> Hsl {
    let t = t.clamp(0.0, 1.0);
    let mut dh = b.h - a.h;
    if dh > 180.0 {
        dh -= 360.0;
    } else if dh < -180.0 {
        dh += 360.0;
    }
    Hsl::new(a.h + dh * t, a.s + (b.s - a.s) * t, a.l + (b.l - a.l) * t)
}

/// Convert normalized HSL (all components `[0, 1]`) to 8-bit RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    if s <= 0.0 {
        let v = to_u8(l);
        return [v, v, v];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, h)),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    ]
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Convert 8-bit RGB to normalized HSL (all components `[0, 1]`).
pub fn rgb_to_hsl(rgb: [u8; 3]) -> (f64, f64, f64) {
    let r = f64::from(rgb[0]) / 255.0;
    let g = f64::from(rgb[1]) / 255.0;
    let b = f64::from(rgb[2]) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

/// Perceptual gray level with the 0.3 / 0.59 / 0.11 weights.
pub fn luma(rgb: [u8; 3]) -> u8 {
    let v = 0.3 * f64::from(rgb[0]) + 0.59 * f64::from(rgb[1]) + 0.11 * f64::from(rgb[2]);
    v.round().clamp(0.0, 255.0) as u8
}

/// Parse `#rrggbb` (case-insensitive).
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn to_u8(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
