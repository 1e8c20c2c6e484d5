//! End-to-end generation against real PNG assets on disk.
//!
//! These tests go through the public API with the production codec backend:
//! scan an asset tree, generate, and inspect the written files.

use image::{Rgba, RgbaImage};
use seed_collage::cache::ImageCache;
use seed_collage::catalog::AssetCatalog;
use seed_collage::config::{self, CategoryConfig, GeneratorConfig};
use seed_collage::imaging::{OutputFormat, RustBackend};
use seed_collage::metadata::{Metadata, TraitValue};
use seed_collage::pipeline::{self, BatchRange, GenerateContext, GenerateError, SeedSource};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixtures
// =========================================================================

fn write_png(path: &Path, color: [u8; 3]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let [r, g, b] = color;
    RgbaImage::from_pixel(12, 8, Rgba([r, g, b, 255]))
        .save(path)
        .unwrap();
}

/// One directory per category, one distinctly coloured PNG per file.
fn asset_tree(categories: &[(&str, &[&str])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (ci, (category, files)) in categories.iter().enumerate() {
        let dir = tmp.path().join(category);
        fs::create_dir_all(&dir).unwrap();
        for (fi, file) in files.iter().enumerate() {
            let shade = (40 * fi + 70 * ci) as u8;
            write_png(&dir.join(file), [shade, 255 - shade, 30 + fi as u8 * 60]);
        }
    }
    tmp
}

fn small_config(categories: &[(&str, u32, u32)]) -> GeneratorConfig {
    let mut config = GeneratorConfig::default();
    config.canvas.size = 96;
    config.canvas.frame_size = 104;
    config.categories = categories
        .iter()
        .map(|(name, min, factor)| CategoryConfig::new(name, *min, *factor))
        .collect();
    config.elements.min_size = 12.0;
    config.elements.max_size = 40.0;
    config.elements.placement_margin = 16;
    config.background.splash_min_radius = 4.0;
    config.background.splash_max_radius = 20.0;
    config.strokes.max_offset = 12.0;
    config.strokes.min_width = 1.0;
    config.strokes.max_width = 3.0;
    config.output.format = OutputFormat::Png;
    config.validate().unwrap();
    config
}

fn generate(assets: &Path, output: &Path, config: &GeneratorConfig, seeds: SeedSource, count: u32) {
    let catalog = AssetCatalog::scan(assets, &config.categories).unwrap();
    let backend = RustBackend::new();
    let cache = ImageCache::new();
    let ctx = GenerateContext {
        config,
        catalog: &catalog,
        backend: &backend,
        cache: &cache,
        signature: None,
    };
    let summary = pipeline::run_batch(BatchRange { start: 1, count }, &seeds, &ctx, output, None);
    assert!(summary.is_success(), "failed instances: {:?}", summary.failed);
}

fn read_metadata(output: &Path, instance: u32) -> Metadata {
    let path = output.join("metadata").join(format!("{instance}.json"));
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn number(meta: &Metadata, trait_type: &str) -> u64 {
    match meta.attribute(trait_type) {
        Some(TraitValue::Number(n)) => *n,
        other => panic!("{trait_type} is not a number: {other:?}"),
    }
}

/// Sum of per-image occurrence traits whose key starts with `prefix`.
fn occurrences(meta: &Metadata, prefix: &str) -> u64 {
    meta.attributes
        .iter()
        .filter(|t| t.trait_type.starts_with(prefix))
        .map(|t| match t.value {
            TraitValue::Number(n) => n,
            TraitValue::Text(_) => 0,
        })
        .sum()
}

// =========================================================================
// Determinism
// =========================================================================

#[test]
fn same_seed_gives_identical_files() {
    let assets = asset_tree(&[("art", &["1.png", "2.png", "3.png"]), ("food", &["1.png", "2.png"])]);
    let config = small_config(&[("art", 1, 2), ("food", 1, 2)]);
    let out_a = TempDir::new().unwrap();
    let out_b = TempDir::new().unwrap();

    generate(assets.path(), out_a.path(), &config, SeedSource::Prefixed("det".into()), 2);
    generate(assets.path(), out_b.path(), &config, SeedSource::Prefixed("det".into()), 2);

    for rel in ["images/1.png", "images/2.png", "metadata/1.json", "metadata/2.json"] {
        assert_eq!(
            fs::read(out_a.path().join(rel)).unwrap(),
            fs::read(out_b.path().join(rel)).unwrap(),
            "{rel} differs between runs"
        );
    }
}

#[test]
fn different_seeds_give_different_images() {
    let assets = asset_tree(&[("art", &["1.png", "2.png", "3.png"])]);
    let config = small_config(&[("art", 1, 2)]);
    let out = TempDir::new().unwrap();
    generate(assets.path(), out.path(), &config, SeedSource::Prefixed("diff".into()), 2);
    assert_ne!(
        fs::read(out.path().join("images/1.png")).unwrap(),
        fs::read(out.path().join("images/2.png")).unwrap()
    );
}

// =========================================================================
// Metadata consistency
// =========================================================================

#[test]
fn image_count_trait_matches_occurrences() {
    let assets = asset_tree(&[("art", &["1.png", "2.png"]), ("food", &["1.png", "2.png", "3.png"])]);
    let config = small_config(&[("art", 1, 2), ("food", 2, 3)]);
    let out = TempDir::new().unwrap();
    generate(assets.path(), out.path(), &config, SeedSource::Prefixed("sum".into()), 4);

    for instance in 1..=4 {
        let meta = read_metadata(out.path(), instance);
        let art = occurrences(&meta, "Art image #");
        let food = occurrences(&meta, "Food image #");
        assert_eq!(number(&meta, "Number of images"), art + food);
        assert!((1..3).contains(&art), "art count {art}");
        assert!((2..5).contains(&food), "food count {food}");
    }
}

#[test]
fn strokes_below_threshold_are_reported_as_zero() {
    let assets = asset_tree(&[("art", &["1.png"])]);
    let mut config = small_config(&[("art", 1, 1)]);
    config.strokes.threshold = 0.0;
    let out = TempDir::new().unwrap();
    generate(assets.path(), out.path(), &config, SeedSource::Prefixed("calm".into()), 3);
    for instance in 1..=3 {
        assert_eq!(number(&read_metadata(out.path(), instance), "Number of strokes"), 0);
    }
}

#[test]
fn strokes_always_drawn_at_full_threshold() {
    let assets = asset_tree(&[("art", &["1.png"])]);
    let mut config = small_config(&[("art", 1, 1)]);
    config.strokes.threshold = 1.0;
    let out = TempDir::new().unwrap();
    generate(assets.path(), out.path(), &config, SeedSource::Prefixed("busy".into()), 3);
    for instance in 1..=3 {
        let strokes = number(&read_metadata(out.path(), instance), "Number of strokes");
        assert!((1..=12).contains(&strokes), "strokes {strokes}");
    }
}

// =========================================================================
// Failure scenarios
// =========================================================================

#[test]
fn empty_category_fails_without_output() {
    let assets = asset_tree(&[("art", &["1.png"]), ("bugs", &[])]);
    let config = small_config(&[("art", 1, 2), ("bugs", 1, 2)]);
    let out = TempDir::new().unwrap();
    let catalog = AssetCatalog::scan(assets.path(), &config.categories).unwrap();
    let backend = RustBackend::new();
    let cache = ImageCache::new();
    let ctx = GenerateContext {
        config: &config,
        catalog: &catalog,
        backend: &backend,
        cache: &cache,
        signature: None,
    };

    let result = pipeline::run_instance(1, "abc123_TEST", &ctx, out.path());
    assert!(matches!(result, Err(GenerateError::EmptyCategory(ref name)) if name == "bugs"));
    assert!(!out.path().join("images").exists());
    assert!(!out.path().join("metadata").exists());
    assert_eq!(cache.stats().total(), 0);
}

#[test]
fn corrupt_asset_is_a_decode_failure() {
    let assets = asset_tree(&[("art", &["1.png"])]);
    fs::write(assets.path().join("art/1.png"), b"not a png").unwrap();
    let config = small_config(&[("art", 1, 1)]);
    let out = TempDir::new().unwrap();
    let catalog = AssetCatalog::scan(assets.path(), &config.categories).unwrap();
    let backend = RustBackend::new();
    let cache = ImageCache::new();
    let ctx = GenerateContext {
        config: &config,
        catalog: &catalog,
        backend: &backend,
        cache: &cache,
        signature: None,
    };
    let result = pipeline::run_instance(1, "x", &ctx, out.path());
    assert!(matches!(result, Err(GenerateError::AssetDecodeFailure { .. })));
    assert!(!out.path().join("images").exists());
}

// =========================================================================
// Listing order
// =========================================================================

#[test]
fn swapping_files_keeps_indices_but_changes_pixels() {
    let assets = asset_tree(&[("art", &["1.png", "2.png", "3.png"])]);
    let config = small_config(&[("art", 1, 2)]);
    let backend = RustBackend::new();

    let compose = || {
        let catalog = AssetCatalog::scan(assets.path(), &config.categories).unwrap();
        let cache = ImageCache::disabled();
        let ctx = GenerateContext {
            config: &config,
            catalog: &catalog,
            backend: &backend,
            cache: &cache,
            signature: None,
        };
        pipeline::compose("abc123_TEST", &ctx).unwrap()
    };

    let before = compose();
    assert_eq!(compose().image, before.image);

    // Swap the contents of 2.png and 3.png by renaming through a temp name.
    let dir = assets.path().join("art");
    fs::rename(dir.join("2.png"), dir.join("tmp.png")).unwrap();
    fs::rename(dir.join("3.png"), dir.join("2.png")).unwrap();
    fs::rename(dir.join("tmp.png"), dir.join("3.png")).unwrap();

    let after = compose();
    assert_eq!(after.selected_counts, before.selected_counts);
    let drew_swapped = before
        .selected_counts
        .keys()
        .any(|k| k == "Art image #2" || k == "Art image #3");
    assert_eq!(after.image != before.image, drew_swapped);
}

// =========================================================================
// File layout
// =========================================================================

#[test]
fn batch_writes_numbered_files_from_start() {
    let assets = asset_tree(&[("art", &["1.png", "2.png"])]);
    let config = small_config(&[("art", 1, 2)]);
    let out = TempDir::new().unwrap();
    let catalog = AssetCatalog::scan(assets.path(), &config.categories).unwrap();
    let backend = RustBackend::new();
    let cache = ImageCache::new();
    let ctx = GenerateContext {
        config: &config,
        catalog: &catalog,
        backend: &backend,
        cache: &cache,
        signature: None,
    };
    let summary = pipeline::run_batch(
        BatchRange { start: 5, count: 2 },
        &SeedSource::Prefixed("layout".into()),
        &ctx,
        out.path(),
        None,
    );
    assert_eq!(summary.generated, 2);
    assert!(summary.cache.misses <= 2);

    for n in [5, 6] {
        let img = image::open(out.path().join(format!("images/{n}.png"))).unwrap();
        assert_eq!((img.width(), img.height()), (104, 104));
        let meta = read_metadata(out.path(), n);
        assert_eq!(meta.name, format!("Attentionless #{n}"));
        assert_eq!(meta.image, format!("{n}.png"));
        assert_eq!(meta.seed, format!("layout_{n}"));
    }
    assert!(!out.path().join("images/1.png").exists());

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("metadata/5.json")).unwrap())
            .unwrap();
    for key in ["name", "description", "image", "external_url", "seed", "attributes"] {
        assert!(raw.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn frame_border_uses_frame_color() {
    let assets = asset_tree(&[("art", &["1.png"])]);
    let mut config = small_config(&[("art", 1, 1)]);
    config.canvas.frame_color = "#102030".into();
    config.strokes.threshold = 0.0;
    let out = TempDir::new().unwrap();
    generate(assets.path(), out.path(), &config, SeedSource::Prefixed("frame".into()), 1);
    let img = image::open(out.path().join("images/1.png")).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [0x10, 0x20, 0x30, 255]);
    assert_eq!(img.get_pixel(103, 103).0, [0x10, 0x20, 0x30, 255]);
}

#[test]
fn config_file_in_asset_root_is_picked_up() {
    let assets = asset_tree(&[("art", &["1.png"])]);
    fs::write(
        assets.path().join(config::CONFIG_FILENAME),
        r#"
[metadata]
name_prefix = "Raw Attention"

[[categories]]
name = "art"
min = 1
factor = 1
"#,
    )
    .unwrap();
    let config = config::load_config(assets.path()).unwrap();
    assert_eq!(config.metadata.name_prefix, "Raw Attention");
    assert_eq!(config.categories, vec![CategoryConfig::new("art", 1, 1)]);
}
