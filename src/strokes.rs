//! Decorative bezier strokes over the framed canvas.
//!
//! Like element plans, strokes are drawn from the stream in phase 1 and
//! painted later from an immutable [`StrokePlan`]. The stroke count is the
//! one painting side effect mirrored into metadata, so it comes straight
//! from the plan.
//!
//! Draw order:
//!
//! ```text
//! gate                 > threshold → no strokes, nothing else drawn
//! count                1 + index(max_strokes)
//! colour mode          < 0.5 → three random hues, else black
//!   [3 hues]           only in hue mode
//! per stroke:
//!   segments           min_segments..=max_segments
//!   start x, start y
//!   width              [min_width, max_width)
//!   colour pick        one of the three hues (drawn in both modes)
//!   alpha              [0.3, 0.7)
//!   per segment:       control 1 (x, y), control 2 (x, y), end (x, y)
//! ```

use crate::config::StrokesConfig;
use crate::imaging::color::Hsl;
use crate::imaging::raster::{BlendMode, CoverageMask};
use crate::seed::RandomStream;
use image::RgbaImage;
use kurbo::{CubicBez, ParamCurve, Point, Vec2};

/// One multi-segment stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Chained segments; each starts where the previous one ended.
    pub segments: Vec<CubicBez>,
    pub width: f64,
    pub color: [u8; 3],
    pub alpha: f64,
}

/// Every stroke of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokePlan {
    pub strokes: Vec<Stroke>,
}

impl StrokePlan {
    pub fn count(&self) -> u32 {
        self.strokes.len() as u32
    }
}

/// Draw the stroke plan for a `canvas_size` square canvas.
pub fn plan(stream: &mut dyn RandomStream, config: &StrokesConfig, canvas_size: u32) -> StrokePlan {
    let gate = stream.next_f64();
    if gate > config.threshold {
        return StrokePlan::default();
    }
    let count_draw = stream.index(config.max_strokes as usize);
    let count = if config.max_strokes == 0 { 0 } else { 1 + count_draw };

    let hues: Option<[f64; 3]> = if stream.chance(0.5) {
        Some([
            stream.range(0.0, 360.0),
            stream.range(0.0, 360.0),
            stream.range(0.0, 360.0),
        ])
    } else {
        None
    };

    let size = f64::from(canvas_size);
    let segment_span = config.max_segments.saturating_sub(config.min_segments) as usize + 1;
    let strokes = (0..count)
        .map(|_| {
            let segments = config.min_segments as usize + stream.index(segment_span);
            let mut prev = Point::new(stream.next_f64() * size, stream.next_f64() * size);
            let width = stream.range(config.min_width, config.max_width);
            let pick = stream.index(3);
            let color = match hues {
                Some(h) => Hsl::new(h[pick], 70.0, 50.0).to_rgb(),
                None => [0, 0, 0],
            };
            let alpha = stream.range(0.3, 0.7);

            let mut offset = |from: Point| {
                from + Vec2::new(
                    stream.range(-config.max_offset, config.max_offset),
                    stream.range(-config.max_offset, config.max_offset),
                )
            };
            let segments = (0..segments)
                .map(|_| {
                    let c1 = offset(prev);
                    let c2 = offset(prev);
                    let end = offset(prev);
                    let seg = CubicBez::new(prev, c1, c2, end);
                    prev = end;
                    seg
                })
                .collect();

            Stroke {
                segments,
                width,
                color,
                alpha,
            }
        })
        .collect();

    StrokePlan { strokes }
}

/// Paint every stroke of `plan` with an overlay blend. Returns the stroke count.
pub fn paint(canvas: &mut RgbaImage, plan: &StrokePlan) -> u32 {
    for stroke in &plan.strokes {
        let mut mask = CoverageMask::new(canvas.width(), canvas.height());
        let radius = stroke.width / 2.0;
        for seg in &stroke.segments {
            let hull = (seg.p1 - seg.p0).hypot() + (seg.p2 - seg.p1).hypot() + (seg.p3 - seg.p2).hypot();
            let steps = (hull / 2.0).ceil().max(1.0) as usize;
            let mut last = seg.p0;
            for i in 1..=steps {
                let p = seg.eval(i as f64 / steps as f64);
                mask.stamp_segment(last, p, radius);
                last = p;
            }
        }
        mask.composite(canvas, stroke.color, stroke.alpha, BlendMode::Overlay);
    }
    plan.count()
}

/// Plan and paint in one step, for callers that own the stream at paint time.
pub fn apply(canvas: &mut RgbaImage, stream: &mut dyn RandomStream, config: &StrokesConfig) -> u32 {
    let plan = plan(stream, config, canvas.width().max(canvas.height()));
    paint(canvas, &plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeededStream;
    use crate::test_helpers::ScriptedStream;
    use image::Rgba;

    fn config() -> StrokesConfig {
        StrokesConfig {
            max_offset: 20.0,
            ..StrokesConfig::default()
        }
    }

    #[test]
    fn gate_above_threshold_skips_strokes() {
        let mut stream = ScriptedStream::new(vec![0.9]);
        let mut canvas = RgbaImage::from_pixel(32, 32, Rgba([128, 128, 128, 255]));
        let before = canvas.clone();
        assert_eq!(apply(&mut canvas, &mut stream, &config()), 0);
        assert_eq!(stream.consumed(), 1);
        assert_eq!(canvas, before);
    }

    #[test]
    fn gate_at_threshold_draws() {
        let mut stream = ScriptedStream::new(vec![0.8, 0.0]);
        let plan = plan(&mut stream, &config(), 100);
        assert_eq!(plan.count(), 1);
    }

    #[test]
    fn count_is_bounded_by_max_strokes() {
        for i in 0..200 {
            let mut stream = SeededStream::derive(&format!("strokes-{i}"));
            stream.skip(1);
            let plan = plan(&mut stream, &config(), 200);
            assert!(plan.count() <= 12);
            for stroke in &plan.strokes {
                assert!((10..=25).contains(&stroke.segments.len()));
                assert!((2.0..12.0).contains(&stroke.width));
                assert!((0.3..0.7).contains(&stroke.alpha));
            }
        }
    }

    #[test]
    fn segments_chain_end_to_start() {
        let mut stream = SeededStream::derive("chain");
        let mut plan = plan(&mut stream, &config(), 200);
        while plan.strokes.is_empty() {
            plan = super::plan(&mut stream, &config(), 200);
        }
        for stroke in &plan.strokes {
            for pair in stroke.segments.windows(2) {
                assert_eq!(pair[0].p3, pair[1].p0);
            }
            for seg in &stroke.segments {
                assert!((seg.p3 - seg.p0).hypot() <= 20.0 * 2f64.sqrt());
            }
        }
    }

    #[test]
    fn black_mode_uses_black() {
        // gate, count → 1 stroke, colour mode 0.9 → black, then the rest
        let mut stream = ScriptedStream::new(vec![0.1, 0.0, 0.9, 0.5]);
        let plan = plan(&mut stream, &config(), 100);
        assert_eq!(plan.strokes[0].color, [0, 0, 0]);
    }

    #[test]
    fn hue_mode_picks_from_three_hues() {
        // gate, count, mode 0.1 → hues at 0.0 * 360 = 0 (red)
        let mut stream = ScriptedStream::new(vec![0.1, 0.0, 0.1, 0.0, 0.0, 0.0, 0.5]);
        let plan = plan(&mut stream, &config(), 100);
        assert_eq!(plan.strokes[0].color, Hsl::new(0.0, 70.0, 50.0).to_rgb());
    }

    #[test]
    fn painting_changes_pixels_under_the_stroke() {
        let stroke = Stroke {
            segments: vec![CubicBez::new(
                Point::new(5.0, 16.0),
                Point::new(12.0, 16.0),
                Point::new(20.0, 16.0),
                Point::new(27.0, 16.0),
            )],
            width: 4.0,
            color: [0, 0, 0],
            alpha: 0.6,
        };
        let plan = StrokePlan {
            strokes: vec![stroke],
        };
        let mut canvas = RgbaImage::from_pixel(32, 32, Rgba([200, 200, 200, 255]));
        assert_eq!(paint(&mut canvas, &plan), 1);
        assert!(canvas.get_pixel(16, 16)[0] < 200);
        assert_eq!(canvas.get_pixel(16, 2)[0], 200);
    }

    #[test]
    fn plan_is_reproducible() {
        let a = plan(&mut SeededStream::derive("abc123_TEST"), &config(), 1024);
        let b = plan(&mut SeededStream::derive("abc123_TEST"), &config(), 1024);
        assert_eq!(a, b);
    }
}
