//! Core data types for translation caching.

use serde::Serialize;

/// A cached (source, target) translation.
///
/// Entries are unique on `source_text` within one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// The text as submitted by the caller, before preprocessing.
    pub source_text: String,
    /// The decoded translation produced by the engine.
    pub target_text: String,
}

impl CacheEntry {
    /// Create a new cache entry.
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self { source_text: source_text.into(), target_text: target_text.into() }
    }
}

/// Cache statistics for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Batch positions served from the cache.
    pub hits: u64,
    /// Batch positions that were not in the cache when the batch arrived.
    pub misses: u64,
    /// Entries dropped to keep the cache within capacity.
    pub evictions: u64,
    /// Number of successful engine invocations.
    pub engine_batches: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_entry_new() {
        let entry = CacheEntry::new("shalom", "salam");
        assert_eq!(entry.source_text, "shalom");
        assert_eq!(entry.target_text, "salam");
    }

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.engine_batches, 0);
        assert_eq!(stats.size, 0);
    }
}
