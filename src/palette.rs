//! Harmonic palette generation.
//!
//! A run derives one [`HarmonicPalette`] from its base colour. The scheme is
//! picked by a single draw; each scheme proposes candidate hues from
//! colour-wheel offsets, the candidates are rounded to whole degrees and
//! deduplicated in proposal order, then capped at `max_hues`.
//!
//! | Scheme | Candidate hues (degrees from base) | Extra draws |
//! |---|---|---|
//! | Analogous | −2s, −s, 0, +s, +2s with step s in `[15, 30)` | 1 |
//! | Soft complementary | 0, 165, 180, 195 | 0 |
//! | Triad | 0, 120 ± 10, 240 ± 10 | 2 |
//! | Monochrome | 0, then four jitters within ±10 | 4 |
//! | Complex | 0, 30, 90, 150, 180, 240, 300 | 0 |
//!
//! After the hue set is fixed, every retained hue draws its saturation
//! offset in `[−15, 15)` around the base saturation (itself clamped to
//! `[30, 70]`); the result is clamped to `[20, 80]`. Lightness is shared.

use crate::config::MAX_PALETTE_HUES;
use crate::imaging::color::{Hsl, normalize_hue};
use crate::seed::RandomStream;
use serde::Serialize;
use std::fmt;

/// Colour-theory scheme a palette was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SchemeType {
    Analogous,
    SoftComplementary,
    Triad,
    Monochrome,
    Complex,
}

impl SchemeType {
    pub const ALL: [SchemeType; 5] = [
        SchemeType::Analogous,
        SchemeType::SoftComplementary,
        SchemeType::Triad,
        SchemeType::Monochrome,
        SchemeType::Complex,
    ];

    /// Human-readable name, used as the metadata trait value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analogous => "Analogous",
            Self::SoftComplementary => "Soft complementary",
            Self::Triad => "Triad",
            Self::Monochrome => "Monochrome",
            Self::Complex => "Complex",
        }
    }
}

impl fmt::Display for SchemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded set of related colours used to tint one run.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicPalette {
    pub base: Hsl,
    pub scheme: SchemeType,
    /// Never empty; at most [`MAX_PALETTE_HUES`] entries.
    pub colors: Vec<Hsl>,
}

impl HarmonicPalette {
    /// Pick one palette colour with a single draw.
    pub fn pick(&self, stream: &mut dyn RandomStream) -> Hsl {
        let i = stream.index(self.colors.len());
        self.colors.get(i).copied().unwrap_or(self.base)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Build a palette from `base`, consuming draws in the documented order.
pub fn generate(base: Hsl, stream: &mut dyn RandomStream, max_hues: usize) -> HarmonicPalette {
    let cap = max_hues.clamp(1, MAX_PALETTE_HUES);
    let scheme = SchemeType::ALL[stream.index(SchemeType::ALL.len())];
    let offsets = candidate_offsets(scheme, stream);

    let mut hues: Vec<f64> = Vec::with_capacity(cap);
    for offset in offsets {
        let hue = normalize_hue((base.h + offset).round());
        if !hues.contains(&hue) {
            hues.push(hue);
        }
        if hues.len() == cap {
            break;
        }
    }

    let base_s = base.s.clamp(30.0, 70.0);
    let colors = hues
        .into_iter()
        .map(|h| {
            let s = (base_s + stream.range(-15.0, 15.0)).clamp(20.0, 80.0);
            Hsl::new(h, s, base.l)
        })
        .collect();

    HarmonicPalette {
        base,
        scheme,
        colors,
    }
}

/// Hue offsets proposed by `scheme`, drawing any jitter it needs.
fn candidate_offsets(scheme: SchemeType, stream: &mut dyn RandomStream) -> Vec<f64> {
    match scheme {
        SchemeType::Analogous => {
            let step = stream.range(15.0, 30.0);
            vec![-2.0 * step, -step, 0.0, step, 2.0 * step]
        }
        SchemeType::SoftComplementary => vec![0.0, 165.0, 180.0, 195.0],
        SchemeType::Triad => {
            let a = stream.range(-10.0, 10.0);
            let b = stream.range(-10.0, 10.0);
            vec![0.0, 120.0 + a, 240.0 + b]
        }
        SchemeType::Monochrome => {
            let mut offsets = vec![0.0];
            offsets.extend((0..4).map(|_| stream.range(-10.0, 10.0)));
            offsets
        }
        SchemeType::Complex => vec![0.0, 30.0, 90.0, 150.0, 180.0, 240.0, 300.0],
    }
}
