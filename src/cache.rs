//! Decoded-image cache shared across the runs of one batch.
//!
//! Decoding is the only I/O a run performs, and the same handful of source
//! images is sampled over and over across a batch. [`ImageCache`] keeps each
//! decoded asset behind an [`Arc`] keyed by its path so later runs reuse it.
//!
//! # Design
//!
//! The cache is an explicit object handed to the pipeline, never global
//! state. A run only reads decoded pixels, so sharing entries cannot affect
//! output: a run produces the same image whether its sources came from the
//! cache or from disk.
//!
//! The cache is scoped to the process. Edits to asset files during a batch
//! are not picked up; restart (or pass `--no-cache`) to see them.
//!
//! ## Bypassing the cache
//!
//! [`ImageCache::disabled`] decodes every request and stores nothing. The CLI
//! uses it for `--no-cache`; tests use it for run isolation.

use crate::imaging::{BackendError, ImageBackend};
use image::RgbaImage;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Decoded assets by path, plus hit/miss counters.
#[derive(Debug, Default)]
pub struct ImageCache {
    /// `None` when the cache is disabled.
    entries: Option<Mutex<HashMap<PathBuf, Arc<RgbaImage>>>>,
    stats: Mutex<CacheStats>,
}

impl ImageCache {
    /// An empty, enabled cache.
    pub fn new() -> Self {
        Self {
            entries: Some(Mutex::new(HashMap::new())),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Return the cached image for `path`, decoding and storing it on a miss.
    ///
    /// The lock is not held while decoding, so concurrent misses on the same
    /// path both decode; callers fan out over distinct paths.
    pub fn get_or_decode(
        &self,
        backend: &dyn ImageBackend,
        path: &Path,
    ) -> Result<Arc<RgbaImage>, BackendError> {
        if let Some(entries) = &self.entries {
            let cached = entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(path)
                .cloned();
            if let Some(image) = cached {
                self.record(CacheStats::hit);
                return Ok(image);
            }
        }

        let image = Arc::new(backend.decode(path)?);
        self.record(CacheStats::miss);
        if let Some(entries) = &self.entries {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.to_path_buf(), Arc::clone(&image));
        }
        Ok(image)
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, update: fn(&mut CacheStats)) {
        update(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Summary of cache performance for a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} decoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} decoded", self.misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;

    #[test]
    fn second_lookup_is_a_hit() {
        let backend = MockBackend::new();
        let cache = ImageCache::new();
        let a = cache.get_or_decode(&backend, Path::new("/a/1.png")).unwrap();
        let b = cache.get_or_decode(&backend, Path::new("/a/1.png")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(backend.decoded_paths(), vec!["/a/1.png"]);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_always_decodes() {
        let backend = MockBackend::new();
        let cache = ImageCache::disabled();
        assert!(!cache.is_enabled());
        cache.get_or_decode(&backend, Path::new("/a/1.png")).unwrap();
        cache.get_or_decode(&backend, Path::new("/a/1.png")).unwrap();
        assert_eq!(backend.decoded_paths().len(), 2);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_decode_is_not_cached() {
        let backend = MockBackend::failing_on("/a/bad.png");
        let cache = ImageCache::new();
        assert!(cache.get_or_decode(&backend, Path::new("/a/bad.png")).is_err());
        assert!(cache.get_or_decode(&backend, Path::new("/a/bad.png")).is_err());
        assert_eq!(backend.decoded_paths().len(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total(), 0);
    }

    #[test]
    fn stats_display() {
        assert_eq!(CacheStats { hits: 0, misses: 4 }.to_string(), "4 decoded");
        assert_eq!(
            CacheStats { hits: 3, misses: 2 }.to_string(),
            "3 cached, 2 decoded (5 total)"
        );
    }
}
