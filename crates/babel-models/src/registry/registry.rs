//! ModelRegistry implementation with lazy construction and explicit free.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use babel_abstraction::{Device, EngineError, LanguagePair};
use tracing::{debug, error, info, warn};

use super::config::RegistryConfig;
use super::instance::ModelInstance;
use super::types::{InstanceSnapshot, RegistryStats};
use crate::cache::CacheConfigError;
use crate::factory::EngineFactory;

/// Per-pair exclusive section guarding "check-then-create" and free.
type Slot = Arc<tokio::sync::Mutex<Option<Arc<ModelInstance>>>>;

/// Registry of resident model instances, keyed by language pair.
///
/// Guarantees at most one instance per pair. Construction of a pair's instance is
/// serialized on that pair's slot only, so unrelated pairs never wait on each other.
/// Slots exist only for supported pairs and are never removed; an empty slot is an
/// absent instance.
pub struct ModelRegistry {
    /// Builds engines for new instances.
    factory: Arc<dyn EngineFactory>,
    /// pair -> slot. Held only long enough to fetch or insert a slot.
    slots: Mutex<HashMap<LanguagePair, Slot>>,
    /// pair -> resident instance, for flush and observation without touching slots.
    /// Written under the pair's slot guard; never held across an await.
    resident: Mutex<HashMap<LanguagePair, Arc<ModelInstance>>>,
    /// Set by `shutdown`; no instance is constructed afterwards.
    shutting_down: AtomicBool,
    /// Cache capacity for new instances.
    capacity: NonZeroUsize,
    /// Device for new instances.
    default_device: Device,
    /// Registry statistics.
    stats: RwLock<RegistryStats>,
}

impl ModelRegistry {
    /// Create a new registry.
    ///
    /// # Arguments
    /// * `factory` - Engine factory used for lazy construction
    /// * `config` - Registry configuration
    ///
    /// # Errors
    /// Returns `CacheConfigError` if the configuration is invalid.
    pub fn new(factory: Arc<dyn EngineFactory>, config: RegistryConfig) -> Result<Self, CacheConfigError> {
        let capacity = config.cache.capacity()?;

        Ok(Self {
            factory,
            slots: Mutex::new(HashMap::new()),
            resident: Mutex::new(HashMap::new()),
            shutting_down: AtomicBool::new(false),
            capacity,
            default_device: config.default_device,
            stats: RwLock::new(RegistryStats::default()),
        })
    }

    /// Get the instance for a pair, constructing it on first use.
    ///
    /// Language codes are canonicalized first, so `("he", "ar")` and `("heb", "arb")`
    /// share one instance.
    ///
    /// # Errors
    /// Returns `EngineError::UnsupportedPair` if the pair has no configured artifact
    /// (the registry is left unchanged), `EngineError::ShuttingDown` after
    /// [`ModelRegistry::shutdown`], or any construction/placement error.
    pub async fn get_or_create(
        &self,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Arc<ModelInstance>, EngineError> {
        self.instance_for(&LanguagePair::new(source_lang, target_lang)).await
    }

    /// Translate a batch with the pair's instance, in request order.
    ///
    /// If the instance is freed between lookup and use, the pair is resolved again once.
    ///
    /// # Errors
    /// Returns configuration or engine errors unchanged.
    pub async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        batch: &[String],
    ) -> Result<Vec<String>, EngineError> {
        let pair = LanguagePair::new(source_lang, target_lang);
        let instance = self.instance_for(&pair).await?;

        match instance.translate(batch).await {
            Err(EngineError::Released(_)) => {
                debug!(pair = %pair, "Instance freed during request, resolving again");
                self.instance_for(&pair).await?.translate(batch).await
            }
            other => other,
        }
    }

    /// Release the pair's instance, if resident.
    ///
    /// Waits for in-flight translations on the instance, moves it off any accelerator,
    /// releases the engine and removes it. Returns `false` if nothing was resident.
    pub async fn free(&self, source_lang: &str, target_lang: &str) -> bool {
        self.free_pair(&LanguagePair::new(source_lang, target_lang)).await
    }

    /// Clear every resident instance's cache; instances stay resident.
    ///
    /// Returns the number of instances flushed. Pairs still under construction are
    /// not waited for.
    pub async fn flush_all_caches(&self) -> usize {
        let instances = self.resident_instances();
        let mut cleared_entries = 0;
        for instance in &instances {
            cleared_entries += instance.clear_cache().await;
        }

        self.stats.write().expect("Stats lock poisoned").flushes += 1;
        info!(instances = instances.len(), cleared_entries, "Flushed all instance caches");
        instances.len()
    }

    /// Every pair the factory can serve, independent of residency.
    pub fn list_supported_pairs(&self) -> Vec<LanguagePair> {
        self.factory.supported_pairs()
    }

    /// Pairs with a resident instance, sorted.
    pub fn resident_pairs(&self) -> Vec<LanguagePair> {
        let mut pairs: Vec<LanguagePair> =
            self.resident.lock().expect("Resident lock poisoned").keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Snapshots of every resident instance, sorted by pair.
    pub async fn snapshots(&self) -> Vec<InstanceSnapshot> {
        let mut snapshots = Vec::new();
        for instance in self.resident_instances() {
            if let Some(snapshot) = instance.snapshot().await {
                snapshots.push(snapshot);
            }
        }
        snapshots.sort_by(|a, b| a.pair.cmp(&b.pair));
        snapshots
    }

    /// Get current registry statistics.
    pub fn stats(&self) -> RegistryStats {
        let resident = self.resident.lock().expect("Resident lock poisoned").len();
        let mut result = self.stats.read().expect("Stats lock poisoned").clone();
        result.resident = resident;
        result
    }

    /// Refuse new constructions, then free every instance. Used at service teardown.
    ///
    /// Constructions already in progress finish and are freed right after.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        let mut pairs: Vec<LanguagePair> =
            self.slots.lock().expect("Registry lock poisoned").keys().cloned().collect();
        pairs.sort();

        let mut freed = 0;
        for pair in &pairs {
            if self.free_pair(pair).await {
                freed += 1;
            }
        }
        info!(freed, "Model registry shut down");
    }

    /// Whether [`ModelRegistry::shutdown`] has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    async fn instance_for(&self, pair: &LanguagePair) -> Result<Arc<ModelInstance>, EngineError> {
        if !self.factory.supports(pair) {
            warn!(pair = %pair, "Requested unsupported language pair");
            return Err(EngineError::unsupported(pair));
        }

        let slot = {
            let mut slots = self.slots.lock().expect("Registry lock poisoned");
            Arc::clone(slots.entry(pair.clone()).or_default())
        };

        let mut guard = slot.lock().await;
        if let Some(instance) = guard.as_ref() {
            debug!(pair = %pair, "Registry hit");
            return Ok(Arc::clone(instance));
        }

        // Checked under the slot guard so shutdown's free of this slot runs after us.
        if self.is_shutting_down() {
            debug!(pair = %pair, "Refusing construction during shutdown");
            return Err(EngineError::ShuttingDown);
        }

        debug!(pair = %pair, "Registry miss, constructing model instance");
        let instance = Arc::new(self.construct(pair).await?);
        *guard = Some(Arc::clone(&instance));
        self.resident.lock().expect("Resident lock poisoned").insert(pair.clone(), Arc::clone(&instance));
        drop(guard);

        self.stats.write().expect("Stats lock poisoned").constructions += 1;
        info!(pair = %pair, device = %self.default_device, "Model instance created");
        Ok(instance)
    }

    async fn free_pair(&self, pair: &LanguagePair) -> bool {
        let Some(slot) = self.existing_slot(pair) else {
            debug!(pair = %pair, "Free requested for absent instance");
            return false;
        };

        let mut guard = slot.lock().await;
        let Some(instance) = guard.take() else {
            debug!(pair = %pair, "Free requested for absent instance");
            return false;
        };
        self.resident.lock().expect("Resident lock poisoned").remove(pair);
        instance.release().await;
        drop(guard);

        self.stats.write().expect("Stats lock poisoned").frees += 1;
        info!(pair = %pair, "Freed model instance");
        true
    }

    async fn construct(&self, pair: &LanguagePair) -> Result<ModelInstance, EngineError> {
        let factory = Arc::clone(&self.factory);
        let owned_pair = pair.clone();
        let mut engine = tokio::task::spawn_blocking(move || factory.create(&owned_pair))
            .await
            .map_err(|e| {
                error!(pair = %pair, error = %e, "Engine construction task failed");
                EngineError::Generation(format!("Engine construction for {pair} failed: {e}"))
            })??;

        engine.to_device(self.default_device)?;
        Ok(ModelInstance::new(engine, self.capacity))
    }

    fn existing_slot(&self, pair: &LanguagePair) -> Option<Slot> {
        self.slots.lock().expect("Registry lock poisoned").get(pair).cloned()
    }

    fn resident_instances(&self) -> Vec<Arc<ModelInstance>> {
        self.resident.lock().expect("Resident lock poisoned").values().cloned().collect()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("capacity", &self.capacity)
            .field("default_device", &self.default_device)
            .finish_non_exhaustive()
    }
}
