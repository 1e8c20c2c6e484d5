//! # Seed Collage
//!
//! A deterministic collage generator. One seed string fixes every decision of
//! a run: the harmonic palette, the background, which source images are
//! sampled from each category, how each one is sized, rotated and filtered,
//! and the decorative strokes on top. The same seed over the same asset
//! listing always yields the same image and the same trait metadata.
//!
//! # Architecture: Two-Phase Runs
//!
//! ```text
//! 1. Plan     seed      →  Composition   (every stream draw, synchronous)
//! 2. Render   plans     →  CollageResult (decode in parallel, paint, frame)
//!    Write    result    →  images/<n>.<ext> + metadata/<n>.json
//! ```
//!
//! Phase 1 consumes the seeded stream in a fixed global order and freezes the
//! results into plain data. Phase 2 never draws from the stream, so parallel
//! decoding, caching, and painting order cannot affect the output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`seed`] | Seeded stream (SHA-256 initial state + LCG), shuffle, seed minting |
//! | [`naming`] | Asset file stem parsing for sequence numbers and trait labels |
//! | [`catalog`] | Per-category asset listings scanned from the asset root |
//! | [`palette`] | Harmonic palette schemes derived from a base colour |
//! | [`planner`] | Per-element transform plans, category sampling, area ordering |
//! | [`compositor`] | Background, element painting, frame, signature |
//! | [`strokes`] | Decorative bezier stroke planning and painting |
//! | [`metadata`] | Trait metadata derived from a finished collage |
//! | [`pipeline`] | One run end to end, batch loop, output files |
//! | [`cache`] | Decoded-image cache shared across a batch |
//! | [`config`] | `collage.toml` loading, merging over stock defaults, validation |
//! | [`imaging`] | Codec backend seam and CPU raster primitives |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Listing Order Is Part Of The Seed
//!
//! Sampling draws an *index* into a category's listing. Listings are sorted
//! (numbered files by number, then the rest by name), so a seed is reproducible
//! across machines, but renaming or adding files changes which file an index
//! points to. Treat an asset directory as frozen once a collection is minted.
//!
//! ## Variants Are Configurations
//!
//! Historical generator variants differ only in size ranges, thresholds and
//! category tables. All of those live in [`config::GeneratorConfig`], so a
//! variant is a `collage.toml`, not a code path.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing and encoding use the `image` crate; painting is done on
//! plain RGBA buffers in [`imaging::raster`]. No system libraries, no GPU, and
//! results do not depend on the host's graphics stack.

pub mod cache;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod palette;
pub mod pipeline;
pub mod planner;
pub mod seed;
pub mod strokes;

#[cfg(test)]
pub(crate) mod test_helpers;
