//! Asset discovery.
//!
//! The asset root holds one directory per configured category, each with
//! sequentially numbered images:
//!
//! ```text
//! images/
//! ├── collage.toml
//! ├── food/
//! │   ├── 1.png
//! │   ├── 2.png
//! │   └── 10.webp
//! └── clown/
//!     ├── 1.jpg
//!     └── notes.txt        # skipped with a warning
//! ```
//!
//! ## Listing order
//!
//! A run samples assets *by index into the listing*, so the listing order is
//! part of the reproducibility contract. Assets are ordered by sequence
//! number, then by filename; assets without a number follow all numbered
//! ones. Renaming files on disk therefore keeps every sampled index stable
//! but changes which file sits at that index.
//!
//! ## Trait keys are unique
//!
//! Metadata counts selections per trait key (`"Food image #3"`), and the key
//! only carries the sequence number. Two files that share a number within a
//! category (`3.png` and `003-x.png`) would merge into one trait, so a scan
//! rejects them with [`CatalogError::DuplicateLabel`].

use crate::config::CategoryConfig;
use crate::imaging::rust_backend::is_supported_input;
use crate::naming::{display_category, parse_asset_name};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No images found in category: {0}")]
    EmptyCategory(String),
    #[error("Category directory not found: {}", .0.display())]
    MissingCategory(PathBuf),
    #[error("Duplicate image label in {category}: {first} and {second} both map to #{label}")]
    DuplicateLabel {
        category: String,
        label: String,
        first: String,
        second: String,
    },
    #[error("Failed to list assets: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One source image available to the sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub category: String,
    pub path: PathBuf,
    pub file_name: String,
    pub stem: String,
    /// Sequence number parsed from the stem.
    pub number: Option<u32>,
}

impl ImageAsset {
    pub fn new(category: &str, path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_asset_name(&file_name);
        Self {
            category: category.to_string(),
            path,
            file_name,
            stem: parsed.stem,
            number: parsed.number,
        }
    }

    /// Sequence number if present, otherwise the stem.
    pub fn label(&self) -> String {
        match self.number {
            Some(n) => n.to_string(),
            None => self.stem.clone(),
        }
    }

    /// Metadata trait key, e.g. `"Food image #3"`.
    pub fn trait_key(&self) -> String {
        format!("{} image #{}", display_category(&self.category), self.label())
    }
}

/// All assets of every configured category, in listing order.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    categories: BTreeMap<String, Vec<ImageAsset>>,
}

impl AssetCatalog {
    /// List every configured category under `root`.
    ///
    /// Missing directories are an error. Empty ones are kept, so `check` can
    /// report them; [`list`](Self::list) rejects them at generation time.
    pub fn scan(root: &Path, categories: &[CategoryConfig]) -> Result<Self, CatalogError> {
        let mut listed = BTreeMap::new();
        for category in categories {
            let dir = root.join(&category.name);
            if !dir.is_dir() {
                return Err(CatalogError::MissingCategory(dir));
            }
            let assets = list_directory(&category.name, &dir)?;
            debug!(category = %category.name, count = assets.len(), "listed category");
            listed.insert(category.name.clone(), assets);
        }
        Ok(Self { categories: listed })
    }

    /// Build a catalog from raw filename listings instead of the filesystem.
    ///
    /// Listings are ordered exactly as [`scan`](Self::scan) orders them.
    pub fn from_listings<S: AsRef<str>>(root: &Path, listings: &[(&str, Vec<S>)]) -> Self {
        let categories = listings
            .iter()
            .map(|(name, files)| {
                let mut assets: Vec<ImageAsset> = files
                    .iter()
                    .map(|f| ImageAsset::new(name, root.join(name).join(f.as_ref())))
                    .collect();
                sort_assets(&mut assets);
                (name.to_string(), assets)
            })
            .collect();
        Self { categories }
    }

    /// Assets of one category in listing order.
    pub fn list(&self, category: &str) -> Result<&[ImageAsset], CatalogError> {
        match self.categories.get(category) {
            Some(assets) if !assets.is_empty() => Ok(assets),
            _ => Err(CatalogError::EmptyCategory(category.to_string())),
        }
    }

    /// Every category with its listing, alphabetically by name.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[ImageAsset])> {
        self.categories
            .iter()
            .map(|(name, assets)| (name.as_str(), assets.as_slice()))
    }

    pub fn total_assets(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

fn list_directory(category: &str, dir: &Path) -> Result<Vec<ImageAsset>, CatalogError> {
    let mut assets = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }
        if !is_supported_input(&path) {
            warn!(path = %path.display(), "skipping unsupported file");
            continue;
        }
        assets.push(ImageAsset::new(category, path));
    }
    sort_assets(&mut assets);
    check_unique_labels(category, &assets)?;
    Ok(assets)
}

fn check_unique_labels(category: &str, assets: &[ImageAsset]) -> Result<(), CatalogError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for asset in assets {
        if let Some(first) = seen.insert(asset.label(), &asset.file_name) {
            return Err(CatalogError::DuplicateLabel {
                category: category.to_string(),
                label: asset.label(),
                first: first.to_string(),
                second: asset.file_name.clone(),
            });
        }
    }
    Ok(())
}

/// Numbered assets by number, then unnumbered; filename breaks ties.
fn sort_assets(assets: &mut [ImageAsset]) {
    assets.sort_by(|a, b| {
        (a.number.is_none(), a.number, &a.file_name).cmp(&(b.number.is_none(), b.number, &b.file_name))
    });
}
