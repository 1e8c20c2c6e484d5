//! Asset filename parsing.
//!
//! Source images are sequentially numbered inside their category directory
//! (`food/1.png`, `food/2.webp`, ...). The number becomes part of the
//! metadata trait (`"Food image #2"`), so it must be derived from the file
//! *stem*, never by chopping a fixed number of characters off the filename:
//! extensions vary in length (`.png`, `.webp`, `.jpeg`).
//!
//! Stems that are not purely numeric still work. A leading `NNN-` prefix
//! supplies the number (`007-teapot.png` → 7), and anything else keeps its
//! stem as the label.

use std::path::Path;

/// Result of parsing an asset filename like `12.webp` or `007-teapot.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAssetName {
    /// Filename stem with the extension removed (`"12"`, `"007-teapot"`).
    pub stem: String,
    /// Sequence number from the stem, if it has one.
    pub number: Option<u32>,
}

/// Parse an asset filename.
///
/// - `"12.webp"` → stem="12", number=Some(12)
/// - `"3.jpeg"` → stem="3", number=Some(3)
/// - `"007-teapot.png"` → stem="007-teapot", number=Some(7)
/// - `"teapot.png"` → stem="teapot", number=None
/// - `"archive.tar.png"` → stem="archive.tar", number=None
pub fn parse_asset_name(file_name: &str) -> ParsedAssetName {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());

    let number = stem.parse::<u32>().ok().or_else(|| {
        stem.split_once('-')
            .and_then(|(prefix, _)| prefix.parse::<u32>().ok())
    });

    ParsedAssetName { stem, number }
}

/// Capitalize the first character of a category name for display
/// (`"food"` → `"Food"`).
pub fn display_category(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
