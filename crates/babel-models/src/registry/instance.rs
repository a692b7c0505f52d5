//! A resident engine together with its translation cache.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::Instant;

use babel_abstraction::{Device, EngineError, LanguagePair, TranslationEngine};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::InstanceSnapshot;
use crate::cache::{CacheStats, TranslationCache};

struct InstanceState {
    /// `None` once the instance has been released.
    engine: Option<Box<dyn TranslationEngine>>,
    cache: TranslationCache,
}

/// One language pair's engine plus its bounded cache.
///
/// All operations take the same per-instance lock, so "check cache → call engine →
/// update cache" is atomic with respect to other batches, flushes and release.
pub struct ModelInstance {
    pair: LanguagePair,
    state: Mutex<InstanceState>,
}

impl ModelInstance {
    /// Wraps `engine` with an empty cache of the given capacity.
    #[must_use]
    pub fn new(engine: Box<dyn TranslationEngine>, capacity: NonZeroUsize) -> Self {
        Self {
            pair: engine.pair().clone(),
            state: Mutex::new(InstanceState {
                engine: Some(engine),
                cache: TranslationCache::with_capacity(capacity),
            }),
        }
    }

    /// The language pair this instance serves.
    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    /// Translate a batch, in order, through the cache.
    ///
    /// # Errors
    /// Returns `EngineError::Released` if the instance was freed, or whatever the
    /// engine reported.
    pub async fn translate(&self, batch: &[String]) -> Result<Vec<String>, EngineError> {
        let start_time = Instant::now();
        let mut state = self.state.lock().await;
        let InstanceState { engine, cache } = &mut *state;
        let engine = engine.as_deref().ok_or_else(|| EngineError::Released(self.pair.to_string()))?;

        let result = cache.resolve(engine, batch).await;

        debug!(
            pair = %self.pair,
            batch_size = batch.len(),
            cache_size = cache.len(),
            duration_ms = start_time.elapsed().as_millis(),
            ok = result.is_ok(),
            "Translate finished"
        );
        result
    }

    /// Current device, or `None` once released.
    pub async fn device(&self) -> Option<Device> {
        self.state.lock().await.engine.as_ref().map(|engine| engine.device())
    }

    /// Move the engine to `device`. Cache contents are unaffected.
    ///
    /// # Errors
    /// Returns `EngineError::Released` if the instance was freed, or the engine's
    /// placement error.
    pub async fn to_device(&self, device: Device) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        let engine =
            state.engine.as_mut().ok_or_else(|| EngineError::Released(self.pair.to_string()))?;
        engine.to_device(device)?;
        info!(pair = %self.pair, device = %device, "Moved model instance");
        Ok(())
    }

    /// Drop every cached translation, keeping the engine. Returns the number dropped.
    pub async fn clear_cache(&self) -> usize {
        let cleared = self.state.lock().await.cache.clear();
        debug!(pair = %self.pair, cleared, "Cleared instance cache");
        cleared
    }

    /// The cached translation for `source_text`, if present.
    pub async fn cached(&self, source_text: &str) -> Option<String> {
        self.state.lock().await.cache.get(source_text).map(ToString::to_string)
    }

    /// Cache counters.
    pub async fn cache_stats(&self) -> CacheStats {
        self.state.lock().await.cache.stats()
    }

    /// Whether the instance has been released.
    pub async fn is_released(&self) -> bool {
        self.state.lock().await.engine.is_none()
    }

    /// Point-in-time view for observability; `None` once released.
    pub async fn snapshot(&self) -> Option<InstanceSnapshot> {
        let state = self.state.lock().await;
        let device = state.engine.as_ref()?.device();
        Some(InstanceSnapshot { pair: self.pair.clone(), device, cache: state.cache.stats() })
    }

    /// Move off any accelerator, release the engine and drop the cache.
    ///
    /// Waits for an in-flight translate on this instance to finish first. Calling it
    /// again is a no-op.
    pub(crate) async fn release(&self) {
        let mut state = self.state.lock().await;
        let Some(mut engine) = state.engine.take() else {
            return;
        };

        let device = engine.device();
        if device.is_accelerator() {
            if let Err(e) = engine.to_device(Device::Cpu) {
                warn!(pair = %self.pair, device = %device, error = %e, "Failed to move engine to cpu before release");
            }
        }
        engine.release();
        state.cache.clear();
        info!(pair = %self.pair, device = %device, "Released model instance");
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance").field("pair", &self.pair).finish_non_exhaustive()
    }
}
