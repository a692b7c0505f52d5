//! TranslationCache implementation with batch resolution and FIFO-over-batches eviction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;

use babel_abstraction::{EngineError, TranslationEngine};
use tracing::debug;

use super::types::{CacheEntry, CacheStats};

/// Bounded source-text → target-text store owned by one model instance.
///
/// Entries are kept in insertion order. After every insertion batch the cache is
/// truncated to its most recently appended `capacity` entries, so eviction is
/// first-in-first-out across batches: a cache hit does not refresh an entry.
#[derive(Debug)]
pub struct TranslationCache {
    /// Entries in insertion order, oldest first.
    entries: VecDeque<CacheEntry>,
    /// source_text -> target_text, mirrors `entries`.
    index: HashMap<String, String>,
    /// Maximum number of entries.
    capacity: NonZeroUsize,
    /// Running counters.
    stats: CacheStats,
}

impl TranslationCache {
    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get().min(1024)),
            index: HashMap::new(),
            capacity,
            stats: CacheStats { capacity: capacity.get(), ..CacheStats::default() },
        }
    }

    /// Resolve a batch of source texts into translations, in request order.
    ///
    /// Texts already cached are served directly; the remaining distinct texts are
    /// preprocessed and sent to `engine` in a single call, then stored. The output has
    /// exactly one translation per input position, duplicates included.
    ///
    /// # Errors
    /// Propagates engine failures unchanged, and returns `EngineError::BatchMismatch`
    /// when the engine answers with the wrong number of outputs. On error the cache
    /// is left exactly as it was before the call.
    pub async fn resolve(
        &mut self,
        engine: &dyn TranslationEngine,
        batch: &[String],
    ) -> Result<Vec<String>, EngineError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        // Hit values are captured before insertion: a large miss set may evict them.
        let mut resolved: HashMap<&str, String> = HashMap::with_capacity(batch.len());
        let mut pending: HashSet<&str> = HashSet::new();
        let mut misses: Vec<&str> = Vec::new();
        let mut hit_count = 0u64;

        for text in batch {
            let text = text.as_str();
            if let Some(target) = self.index.get(text) {
                hit_count += 1;
                resolved.entry(text).or_insert_with(|| target.clone());
            } else if pending.insert(text) {
                misses.push(text);
            }
        }
        let miss_count = batch.len() as u64 - hit_count;

        if !misses.is_empty() {
            let inputs: Vec<String> = misses.iter().map(|text| engine.preprocess(text)).collect();
            debug!(
                pair = %engine.pair(),
                hits = hit_count,
                unique_misses = misses.len(),
                "Sending cache misses to engine"
            );

            let outputs = engine.generate(&inputs).await?;
            if outputs.len() != misses.len() {
                return Err(EngineError::BatchMismatch {
                    expected: misses.len(),
                    actual: outputs.len(),
                });
            }

            self.stats.engine_batches += 1;
            self.insert_batch(
                misses.iter().zip(&outputs).map(|(source, target)| ((*source).to_string(), target.clone())),
            );
            resolved.extend(misses.into_iter().zip(outputs));
        } else {
            debug!(pair = %engine.pair(), hits = hit_count, "Batch fully served from cache");
        }

        self.stats.hits += hit_count;
        self.stats.misses += miss_count;

        // Every position is either a hit or one of the freshly generated misses.
        Ok(batch.iter().map(|text| resolved[text.as_str()].clone()).collect())
    }

    /// Insert translations as a keyed upsert, then enforce capacity.
    ///
    /// An entry whose source text is already present replaces the old one and is
    /// re-appended as the newest. Returns the number of entries evicted.
    pub fn insert_batch<I>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (source_text, target_text) in pairs {
            // Linear in the cache size per replaced key. `resolve` only inserts misses,
            // so it never takes this branch.
            if self.index.contains_key(&source_text) {
                self.entries.retain(|entry| entry.source_text != source_text);
            }
            self.index.insert(source_text.clone(), target_text.clone());
            self.entries.push_back(CacheEntry { source_text, target_text });
        }

        let mut evicted = 0;
        while self.entries.len() > self.capacity.get() {
            if let Some(oldest) = self.entries.pop_front() {
                self.index.remove(&oldest.source_text);
                evicted += 1;
            }
        }

        if evicted > 0 {
            debug!(evicted, size = self.entries.len(), "Evicted oldest cache entries");
        }
        self.stats.evictions += evicted as u64;
        evicted
    }

    /// Look up the cached translation for `source_text`.
    pub fn get(&self, source_text: &str) -> Option<&str> {
        self.index.get(source_text).map(String::as_str)
    }

    /// Whether `source_text` is cached.
    pub fn contains(&self, source_text: &str) -> bool {
        self.index.contains_key(source_text)
    }

    /// Entries in insertion order, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Remove every entry. Counters are kept. Returns the number of entries dropped.
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        self.index.clear();
        cleared
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats { size: self.entries.len(), ..self.stats.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use babel_abstraction::{Device, LanguagePair};
    use std::sync::Mutex;

    /// Upper-cases its input and records every batch it receives.
    struct RecordingEngine {
        pair: LanguagePair,
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
        drop_last_output: bool,
    }

    impl RecordingEngine {
        fn new() -> Self {
            Self {
                pair: LanguagePair::new("heb", "arb"),
                calls: Mutex::new(Vec::new()),
                fail: false,
                drop_last_output: false,
            }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new() }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranslationEngine for RecordingEngine {
        fn pair(&self) -> &LanguagePair {
            &self.pair
        }

        fn preprocess(&self, text: &str) -> String {
            format!(">>ara<< {text}")
        }

        async fn generate(&self, batch: &[String]) -> Result<Vec<String>, EngineError> {
            self.calls.lock().unwrap().push(batch.to_vec());
            if self.fail {
                return Err(EngineError::Generation("out of memory".to_string()));
            }
            let mut outputs: Vec<String> = batch
                .iter()
                .map(|input| input.trim_start_matches(">>ara<< ").to_uppercase())
                .collect();
            if self.drop_last_output {
                outputs.pop();
            }
            Ok(outputs)
        }

        fn device(&self) -> Device {
            Device::Cpu
        }

        fn to_device(&mut self, _device: Device) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn cache(capacity: usize) -> TranslationCache {
        TranslationCache::with_capacity(NonZeroUsize::new(capacity).unwrap())
    }

    fn batch(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| (*t).to_string()).collect()
    }

    fn sources(cache: &TranslationCache) -> Vec<String> {
        cache.entries().map(|e| e.source_text.clone()).collect()
    }

    #[tokio::test]
    async fn test_resolve_preserves_order_and_duplicates() {
        let engine = RecordingEngine::new();
        let mut cache = cache(16);

        let result = cache.resolve(&engine, &batch(&["a", "b", "a"])).await.unwrap();

        assert_eq!(result, vec!["A", "B", "A"]);
        assert_eq!(result[0], result[2]);
        // Duplicate misses go to the engine once.
        assert_eq!(engine.calls(), vec![vec![">>ara<< a".to_string(), ">>ara<< b".to_string()]]);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_twice_does_not_call_engine_again() {
        let engine = RecordingEngine::new();
        let mut cache = cache(16);
        let request = batch(&["shalom", "boker tov"]);

        let first = cache.resolve(&engine, &request).await.unwrap();
        let second = cache.resolve(&engine, &request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.calls().len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.engine_batches, 1);
    }

    #[tokio::test]
    async fn test_resolve_empty_batch_skips_engine() {
        let engine = RecordingEngine::new();
        let mut cache = cache(4);

        let result = cache.resolve(&engine, &[]).await.unwrap();

        assert!(result.is_empty());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_mixed_hits_and_misses() {
        let engine = RecordingEngine::new();
        let mut cache = cache(16);
        cache.resolve(&engine, &batch(&["b"])).await.unwrap();

        let result = cache.resolve(&engine, &batch(&["a", "b", "c", "b", "a"])).await.unwrap();

        assert_eq!(result, vec!["A", "B", "C", "B", "A"]);
        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], vec![">>ara<< a".to_string(), ">>ara<< c".to_string()]);
    }

    #[tokio::test]
    async fn test_capacity_scenario_evicts_oldest_first() {
        let engine = RecordingEngine::new();
        let mut cache = cache(2);

        cache.resolve(&engine, &batch(&["a", "b"])).await.unwrap();
        assert_eq!(sources(&cache), vec!["a", "b"]);

        cache.resolve(&engine, &batch(&["c"])).await.unwrap();
        assert_eq!(sources(&cache), vec!["b", "c"]);
        assert!(!cache.contains("a"));

        let result = cache.resolve(&engine, &batch(&["a"])).await.unwrap();
        assert_eq!(result, vec!["A"]);
        assert_eq!(engine.calls().len(), 3);
        assert_eq!(engine.calls()[2], vec![">>ara<< a".to_string()]);
        assert_eq!(cache.stats().evictions, 2);
    }

    #[tokio::test]
    async fn test_hits_do_not_refresh_age() {
        let engine = RecordingEngine::new();
        let mut cache = cache(2);

        cache.resolve(&engine, &batch(&["a", "b"])).await.unwrap();
        // "a" is a hit here, but it stays the oldest entry.
        cache.resolve(&engine, &batch(&["a", "c"])).await.unwrap();

        assert_eq!(sources(&cache), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_batch_larger_than_capacity_still_resolves() {
        let engine = RecordingEngine::new();
        let mut cache = cache(2);
        cache.resolve(&engine, &batch(&["x"])).await.unwrap();

        let result = cache.resolve(&engine, &batch(&["x", "a", "b", "c", "d"])).await.unwrap();

        assert_eq!(result, vec!["X", "A", "B", "C", "D"]);
        assert_eq!(cache.len(), 2);
        assert_eq!(sources(&cache), vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_engine_failure_leaves_cache_unchanged() {
        let mut cache = cache(4);
        cache.resolve(&RecordingEngine::new(), &batch(&["a"])).await.unwrap();
        let before = cache.stats();

        let engine = RecordingEngine::failing();
        let err = cache.resolve(&engine, &batch(&["a", "b"])).await.unwrap_err();

        assert!(matches!(err, EngineError::Generation(_)));
        assert_eq!(sources(&cache), vec!["a"]);
        assert_eq!(cache.stats(), before);
    }

    #[tokio::test]
    async fn test_engine_output_count_mismatch_is_rejected() {
        let engine = RecordingEngine { drop_last_output: true, ..RecordingEngine::new() };
        let mut cache = cache(4);

        let err = cache.resolve(&engine, &batch(&["a", "b"])).await.unwrap_err();

        assert_eq!(err, EngineError::BatchMismatch { expected: 2, actual: 1 });
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_batch_upserts_by_source_text() {
        let mut cache = cache(3);
        cache.insert_batch(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);

        let evicted = cache.insert_batch(vec![("a".to_string(), "3".to_string())]);

        assert_eq!(evicted, 0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some("3"));
        assert_eq!(sources(&cache), vec!["b", "a"]);
    }

    #[test]
    fn test_upserted_entry_is_evicted_last() {
        let mut cache = cache(3);
        cache.insert_batch(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("c".to_string(), "3".to_string()),
        ]);

        cache.insert_batch(vec![("a".to_string(), "4".to_string())]);
        let evicted = cache.insert_batch(vec![
            ("d".to_string(), "5".to_string()),
            ("e".to_string(), "6".to_string()),
        ]);

        assert_eq!(evicted, 2);
        assert_eq!(sources(&cache), vec!["a", "d", "e"]);
        assert_eq!(cache.get("a"), Some("4"));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_insert_batch_same_pair_twice_keeps_one_entry() {
        let mut cache = cache(3);
        cache.insert_batch(vec![("a".to_string(), "1".to_string())]);
        cache.insert_batch(vec![("a".to_string(), "1".to_string())]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some("1"));
    }

    #[test]
    fn test_clear_empties_cache_but_keeps_counters() {
        let mut cache = cache(1);
        cache.insert_batch(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);

        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.capacity(), 1);
    }
}
