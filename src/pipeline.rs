//! One generation run, and the batch loop around it.
//!
//! A run turns a seed into two files:
//!
//! ```text
//! seed ──► plan_composition ──► decode sources ──► render ──► encode ─┐
//!          (every draw)         (rayon, cached)    (no draws)          ├─► images/<n>.<ext>
//!                                                  derive metadata ───┴─► metadata/<n>.json
//! ```
//!
//! Failures are fatal to the run and leave no files behind: every category is
//! checked before the first draw, both output buffers are produced before
//! either file is written, and the two files are staged and renamed together.
//! The batch reports a failed instance and moves on.

use crate::cache::{CacheStats, ImageCache};
use crate::catalog::{AssetCatalog, CatalogError};
use crate::compositor::{self, CollageResult, RenderError, SourceImages};
use crate::config::GeneratorConfig;
use crate::imaging::params::{EncodeParams, Quality};
use crate::imaging::{BackendError, ImageBackend};
use crate::metadata::{self, Metadata, MetadataContext};
use crate::palette::SchemeType;
use crate::planner::DrawQueueItem;
use crate::seed::{generate_seed, prefixed_seed};
use image::RgbaImage;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const IMAGES_DIR: &str = "images";
pub const METADATA_DIR: &str = "metadata";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Category has no assets: {0}")]
    EmptyCategory(String),
    #[error("Category directory not found: {}", .0.display())]
    MissingCategory(PathBuf),
    #[error("Failed to decode {}: {message}", path.display())]
    AssetDecodeFailure { path: PathBuf, message: String },
    #[error("Encode failed: {0}")]
    EncodeFailure(String),
    #[error("Asset scan failed: {0}")]
    Walk(walkdir::Error),
    #[error("{0}")]
    Catalog(CatalogError),
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CatalogError> for GenerateError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::EmptyCategory(name) => Self::EmptyCategory(name),
            CatalogError::MissingCategory(path) => Self::MissingCategory(path),
            CatalogError::Walk(e) => Self::Walk(e),
            other @ CatalogError::DuplicateLabel { .. } => Self::Catalog(other),
        }
    }
}

impl From<BackendError> for GenerateError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Io(e) => Self::Io(e),
            BackendError::Decode { path, message } => Self::AssetDecodeFailure { path, message },
            BackendError::Encode(message) => Self::EncodeFailure(message),
        }
    }
}

/// Everything a run reads besides its seed. Shared by every run of a batch.
#[derive(Clone, Copy)]
pub struct GenerateContext<'a> {
    pub config: &'a GeneratorConfig,
    pub catalog: &'a AssetCatalog,
    pub backend: &'a dyn ImageBackend,
    pub cache: &'a ImageCache,
    pub signature: Option<&'a RgbaImage>,
}

/// Decode the configured signature overlay, if any. Relative paths resolve
/// against the asset root.
pub fn load_signature(
    config: &GeneratorConfig,
    assets_root: &Path,
    backend: &dyn ImageBackend,
    cache: &ImageCache,
) -> Result<Option<Arc<RgbaImage>>, GenerateError> {
    match &config.signature.path {
        Some(path) => Ok(Some(cache.get_or_decode(backend, &assets_root.join(path))?)),
        None => Ok(None),
    }
}

/// Fail with `EmptyCategory` before any draw if a configured category has no assets.
pub fn check_categories(config: &GeneratorConfig, catalog: &AssetCatalog) -> Result<(), GenerateError> {
    for category in &config.categories {
        catalog.list(&category.name)?;
    }
    Ok(())
}

/// Decode every distinct asset in the queue in parallel.
pub fn decode_sources(
    queue: &[DrawQueueItem],
    backend: &dyn ImageBackend,
    cache: &ImageCache,
) -> Result<SourceImages, GenerateError> {
    let mut seen = HashSet::new();
    let paths: Vec<&Path> = queue
        .iter()
        .map(|item| item.asset.path.as_path())
        .filter(|path| seen.insert(*path))
        .collect();

    let decoded: Vec<(PathBuf, Arc<RgbaImage>)> = paths
        .par_iter()
        .map(|path| {
            cache
                .get_or_decode(backend, path)
                .map(|image| (path.to_path_buf(), image))
        })
        .collect::<Result<_, _>>()?;
    Ok(decoded.into_iter().collect())
}

/// Produce the collage for `seed` without touching the output directory.
pub fn compose(seed: &str, ctx: &GenerateContext<'_>) -> Result<CollageResult, GenerateError> {
    check_categories(ctx.config, ctx.catalog)?;
    let composition = compositor::plan_composition(seed, ctx.config, ctx.catalog)?;
    let sources = decode_sources(&composition.sampling.queue, ctx.backend, ctx.cache)?;
    debug!(seed, sources = sources.len(), "decoded sources");
    Ok(compositor::render(&composition, &sources, ctx.signature, ctx.config)?)
}

/// Files and facts of one finished instance.
#[derive(Debug, Clone)]
pub struct InstanceOutput {
    pub instance: u32,
    pub seed: String,
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata: Metadata,
    pub element_count: u32,
    pub stroke_count: u32,
    pub scheme: SchemeType,
}

/// Output file paths of instance `n`.
pub fn output_paths(output_dir: &Path, instance: u32, extension: &str) -> (PathBuf, PathBuf) {
    (
        output_dir.join(IMAGES_DIR).join(format!("{instance}.{extension}")),
        output_dir.join(METADATA_DIR).join(format!("{instance}.json")),
    )
}

/// Write every file or none of them.
///
/// Each file is staged as `<path>.tmp`, then the staged files are renamed
/// into place in order. Any failure removes the staged files and the files
/// already renamed, so an instance never leaves an image without metadata.
fn write_outputs(files: &[(&Path, &[u8])]) -> std::io::Result<()> {
    let staged: Vec<PathBuf> = files.iter().map(|(path, _)| staging_path(path)).collect();
    let mut placed: Vec<&Path> = Vec::new();

    let result = stage_and_place(files, &staged, &mut placed);
    if result.is_err() {
        for path in staged.iter().map(PathBuf::as_path).chain(placed) {
            std::fs::remove_file(path).ok();
        }
    }
    result
}

fn stage_and_place<'a>(
    files: &[(&'a Path, &[u8])],
    staged: &[PathBuf],
    placed: &mut Vec<&'a Path>,
) -> std::io::Result<()> {
    for ((_, bytes), tmp) in files.iter().zip(staged) {
        std::fs::write(tmp, bytes)?;
    }
    for ((path, _), tmp) in files.iter().zip(staged) {
        std::fs::rename(tmp, path)?;
        placed.push(*path);
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Run one instance end to end and write its image and metadata.
pub fn run_instance(
    instance: u32,
    seed: &str,
    ctx: &GenerateContext<'_>,
    output_dir: &Path,
) -> Result<InstanceOutput, GenerateError> {
    let result = compose(seed, ctx)?;

    let params = EncodeParams {
        format: ctx.config.output.format,
        quality: Quality::new(ctx.config.output.quality),
    };
    let extension = params.format.extension();
    let image_bytes = ctx.backend.encode(&result.image, &params)?;
    let metadata = metadata::derive(
        &result,
        &MetadataContext {
            instance,
            extension,
            config: &ctx.config.metadata,
        },
    );
    let metadata_bytes = serde_json::to_vec_pretty(&metadata)?;

    let (image_path, metadata_path) = output_paths(output_dir, instance, extension);
    std::fs::create_dir_all(output_dir.join(IMAGES_DIR))?;
    std::fs::create_dir_all(output_dir.join(METADATA_DIR))?;
    write_outputs(&[
        (image_path.as_path(), image_bytes.as_slice()),
        (metadata_path.as_path(), metadata_bytes.as_slice()),
    ])?;

    let element_count: u32 = result.selected_counts.values().sum();
    info!(
        instance,
        seed,
        elements = element_count,
        strokes = result.stroke_count,
        scheme = %result.scheme,
        "generated instance"
    );

    Ok(InstanceOutput {
        instance,
        seed: seed.to_string(),
        image_path,
        metadata_path,
        metadata,
        element_count,
        stroke_count: result.stroke_count,
        scheme: result.scheme,
    })
}

/// Where instance seeds come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// Fresh random seed per instance.
    Random,
    /// `"{prefix}_{n}"`, reproducible across invocations.
    Prefixed(String),
}

impl SeedSource {
    pub fn seed_for(&self, instance: u32) -> String {
        match self {
            Self::Random => generate_seed(),
            Self::Prefixed(prefix) => prefixed_seed(prefix, instance),
        }
    }
}

/// Progress events emitted by [`run_batch`].
#[derive(Debug, Clone)]
pub enum GenerateEvent {
    InstanceStarted {
        instance: u32,
        seed: String,
    },
    InstanceFinished {
        instance: u32,
        image_path: PathBuf,
        metadata_path: PathBuf,
        elements: u32,
        strokes: u32,
        scheme: SchemeType,
    },
    InstanceFailed {
        instance: u32,
        seed: String,
        error: String,
    },
}

/// Instances to generate: `start..start + count`, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub start: u32,
    pub count: u32,
}

impl BatchRange {
    pub fn instances(self) -> impl Iterator<Item = u32> {
        (0..self.count).map(move |i| self.start.saturating_add(i))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub generated: u32,
    /// Instance numbers that failed, in order.
    pub failed: Vec<u32>,
    pub cache: CacheStats,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generate every instance of `range` in order. A failed instance is
/// reported and skipped; the batch continues with the next one.
pub fn run_batch(
    range: BatchRange,
    seeds: &SeedSource,
    ctx: &GenerateContext<'_>,
    output_dir: &Path,
    progress: Option<Sender<GenerateEvent>>,
) -> BatchSummary {
    let emit = |event: GenerateEvent| {
        if let Some(tx) = &progress {
            tx.send(event).ok();
        }
    };

    let mut summary = BatchSummary::default();
    for instance in range.instances() {
        let seed = seeds.seed_for(instance);
        emit(GenerateEvent::InstanceStarted {
            instance,
            seed: seed.clone(),
        });
        match run_instance(instance, &seed, ctx, output_dir) {
            Ok(out) => {
                summary.generated += 1;
                emit(GenerateEvent::InstanceFinished {
                    instance,
                    image_path: out.image_path,
                    metadata_path: out.metadata_path,
                    elements: out.element_count,
                    strokes: out.stroke_count,
                    scheme: out.scheme,
                });
            }
            Err(e) => {
                warn!(instance, seed = %seed, error = %e, "instance failed");
                summary.failed.push(instance);
                emit(GenerateEvent::InstanceFailed {
                    instance,
                    seed,
                    error: e.to_string(),
                });
            }
        }
    }
    summary.cache = ctx.cache.stats();
    summary
}
