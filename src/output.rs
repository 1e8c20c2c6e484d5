//! CLI output formatting for the `check` and `generate` commands.
//!
//! # Information-First Display
//!
//! Every entity (category, asset, instance) leads with its positional index
//! and identity, with file paths as indented context lines. The trait key of
//! an asset is shown exactly as it will appear in metadata, so `check` doubles
//! as a preview of the trait vocabulary.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Categories
//! 001 Art (3 images)
//!     Source: art/
//!     Sampling: 1-2 per collage
//!     001 Art image #1
//!         Source: 1.png
//!     002 Art image #2
//!         Source: 2.png
//!
//! 3 images in 1 category
//! ```
//!
//! ## Generate
//!
//! ```text
//! 001 seed 9f2c41...
//!     Image: out/images/1.webp
//!     Metadata: out/metadata/1.json
//!     7 elements, 4 strokes, Triad scheme
//! 002 seed 1be077...
//!     Failed: Category has no assets: bugs
//!
//! Generated 1 of 2 instances (failed: 002)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::catalog::AssetCatalog;
use crate::config::GeneratorConfig;
use crate::naming::display_category;
use crate::pipeline::{BatchSummary, GenerateEvent};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `"1 image"`, `"3 images"`.
fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the scanned catalog with each category's sampling range.
pub fn format_catalog(catalog: &AssetCatalog, config: &GeneratorConfig) -> Vec<String> {
    let mut lines = vec!["Categories".to_string()];

    for (i, (name, assets)) in catalog.categories().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            display_category(name),
            count(assets.len(), "image", "images")
        ));
        lines.push(format!("{}Source: {}/", indent(1), name));
        if let Some(category) = config.category(name) {
            let max = category.min + category.factor - 1;
            let range = if max == category.min {
                category.min.to_string()
            } else {
                format!("{}-{}", category.min, max)
            };
            lines.push(format!("{}Sampling: {} per collage", indent(1), range));
        }
        for (j, asset) in assets.iter().enumerate() {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(j + 1),
                asset.trait_key()
            ));
            lines.push(format!("{}Source: {}", indent(2), asset.file_name));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} in {}",
        count(catalog.total_assets(), "image", "images"),
        count(catalog.categories().count(), "category", "categories")
    ));
    lines
}

/// Print catalog output to stdout.
pub fn print_catalog(catalog: &AssetCatalog, config: &GeneratorConfig) {
    for line in format_catalog(catalog, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::InstanceStarted { instance, seed } => {
            vec![format!("{} seed {}", format_index(*instance as usize), seed)]
        }
        GenerateEvent::InstanceFinished {
            image_path,
            metadata_path,
            elements,
            strokes,
            scheme,
            ..
        } => vec![
            format!("{}Image: {}", indent(1), image_path.display()),
            format!("{}Metadata: {}", indent(1), metadata_path.display()),
            format!(
                "{}{}, {}, {} scheme",
                indent(1),
                count(*elements as usize, "element", "elements"),
                count(*strokes as usize, "stroke", "strokes"),
                scheme
            ),
        ],
        GenerateEvent::InstanceFailed { error, .. } => {
            vec![format!("{}Failed: {}", indent(1), error)]
        }
    }
}

/// Format the closing line of a batch.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let attempted = summary.generated as usize + summary.failed.len();
    let line = if summary.failed.is_empty() {
        format!("Generated {}", count(attempted, "instance", "instances"))
    } else {
        let failed: Vec<String> = summary
            .failed
            .iter()
            .map(|n| format_index(*n as usize))
            .collect();
        format!(
            "Generated {} of {} (failed: {})",
            summary.generated,
            count(attempted, "instance", "instances"),
            failed.join(", ")
        )
    };
    vec![String::new(), line]
}

/// Print the batch summary to stdout.
pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::config::CategoryConfig;
    use crate::palette::SchemeType;
    use std::path::{Path, PathBuf};

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn catalog_lists_categories_and_trait_keys() {
        let catalog = AssetCatalog::from_listings(
            Path::new("/assets"),
            &[("art", vec!["1.png", "2.png"]), ("food", vec!["3.webp"])],
        );
        let mut config = GeneratorConfig::default();
        config.categories = vec![CategoryConfig::new("art", 1, 2), CategoryConfig::new("food", 2, 1)];
        let lines = format_catalog(&catalog, &config);
        assert_eq!(
            lines,
            vec![
                "Categories",
                "001 Art (2 images)",
                "    Source: art/",
                "    Sampling: 1-2 per collage",
                "    001 Art image #1",
                "        Source: 1.png",
                "    002 Art image #2",
                "        Source: 2.png",
                "002 Food (1 image)",
                "    Source: food/",
                "    Sampling: 2 per collage",
                "    001 Food image #3",
                "        Source: 3.webp",
                "",
                "3 images in 2 categories",
            ]
        );
    }

    #[test]
    fn single_category_summary_is_singular() {
        let catalog =
            AssetCatalog::from_listings(Path::new("/assets"), &[("art", vec!["1.png"])]);
        let lines = format_catalog(&catalog, &GeneratorConfig::default());
        assert_eq!(lines.last().unwrap(), "1 image in 1 category");
        // no sampling line for a category missing from the config
        assert!(!lines.iter().any(|l| l.contains("Sampling")));
    }

    #[test]
    fn started_event_shows_seed() {
        let event = GenerateEvent::InstanceStarted {
            instance: 7,
            seed: "abc123_TEST".into(),
        };
        assert_eq!(format_generate_event(&event), vec!["007 seed abc123_TEST"]);
    }

    #[test]
    fn finished_event_shows_files_and_counts() {
        let event = GenerateEvent::InstanceFinished {
            instance: 1,
            image_path: PathBuf::from("out/images/1.webp"),
            metadata_path: PathBuf::from("out/metadata/1.json"),
            elements: 7,
            strokes: 1,
            scheme: SchemeType::SoftComplementary,
        };
        assert_eq!(
            format_generate_event(&event),
            vec![
                "    Image: out/images/1.webp",
                "    Metadata: out/metadata/1.json",
                "    7 elements, 1 stroke, Soft complementary scheme",
            ]
        );
    }

    #[test]
    fn failed_event_shows_error() {
        let event = GenerateEvent::InstanceFailed {
            instance: 2,
            seed: "x".into(),
            error: "Category has no assets: bugs".into(),
        };
        assert_eq!(
            format_generate_event(&event),
            vec!["    Failed: Category has no assets: bugs"]
        );
    }

    #[test]
    fn summary_all_succeeded() {
        let summary = BatchSummary {
            generated: 3,
            failed: vec![],
            cache: CacheStats::default(),
        };
        assert_eq!(format_batch_summary(&summary), vec!["", "Generated 3 instances"]);
    }

    #[test]
    fn summary_lists_failures() {
        let summary = BatchSummary {
            generated: 1,
            failed: vec![2, 4],
            cache: CacheStats::default(),
        };
        assert_eq!(
            format_batch_summary(&summary),
            vec!["", "Generated 1 of 3 instances (failed: 002, 004)"]
        );
    }
}
