//! Translation service facade.
//!
//! Owns the model registry and the static catalog for the lifetime of the server and
//! exposes the operations the HTTP layer serves.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use babel_abstraction::{EngineError, LanguagePair, canonical_language};
use babel_models::{
    CatalogEngineFactory, EngineFactory, InstanceSnapshot, ModelCatalog, ModelRegistry,
    RegistryStats,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

/// Registry and per-instance statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    /// Registry counters.
    pub registry: RegistryStats,
    /// One entry per resident instance.
    pub instances: Vec<InstanceSnapshot>,
}

/// The translation service.
#[derive(Debug)]
pub struct TranslationService {
    registry: Arc<ModelRegistry>,
    catalog: Arc<ModelCatalog>,
}

impl TranslationService {
    /// Create a service from an existing registry and the catalog it serves.
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>, catalog: Arc<ModelCatalog>) -> Self {
        Self { registry, catalog }
    }

    /// Build the catalog, engine factory and registry described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the model settings are invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = Arc::new(ModelCatalog::load(&config.models.catalog_path)?);
        info!(
            catalog = %config.models.catalog_path.display(),
            pairs = catalog.len(),
            backend = %config.models.backend,
            "Loaded model catalog"
        );
        Self::with_catalog(catalog, config)
    }

    /// Like [`TranslationService::from_config`], with an already loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the model settings are invalid.
    pub fn with_catalog(catalog: Arc<ModelCatalog>, config: &Config) -> Result<Self> {
        let backend = config.models.engine_backend()?;
        let factory: Arc<dyn EngineFactory> =
            Arc::new(CatalogEngineFactory::new(Arc::clone(&catalog), backend));
        let registry = Arc::new(ModelRegistry::new(factory, config.models.registry_config())?);
        Ok(Self::new(registry, catalog))
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Every configured artifact name.
    pub fn models(&self) -> Vec<String> {
        self.catalog.model_names()
    }

    /// Every configured language pair.
    pub fn pairs(&self) -> Vec<LanguagePair> {
        self.registry.list_supported_pairs()
    }

    /// Configured pairs collapsed into `a <--> b` / `a --> b` directions.
    pub fn supported_translations(&self) -> Vec<String> {
        self.catalog.directions().iter().map(ToString::to_string).collect()
    }

    /// Translate a single text.
    ///
    /// # Errors
    ///
    /// Returns the configuration or engine error for the pair.
    pub async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> std::result::Result<String, EngineError> {
        let mut translated = self.translate_list(source_lang, target_lang, &[text.to_string()]).await?;
        translated.pop().ok_or(EngineError::BatchMismatch { expected: 1, actual: 0 })
    }

    /// Translate a list of texts, preserving order and length.
    ///
    /// # Errors
    ///
    /// Returns the configuration or engine error for the pair.
    pub async fn translate_list(
        &self,
        source_lang: &str,
        target_lang: &str,
        texts: &[String],
    ) -> std::result::Result<Vec<String>, EngineError> {
        let start_time = Instant::now();
        let translated = self.registry.translate(source_lang, target_lang, texts).await?;
        debug!(
            source_lang = %source_lang,
            target_lang = %target_lang,
            count = texts.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Translation completed"
        );
        Ok(translated)
    }

    /// Release the pair's model instance. Returns `false` if it was not resident.
    pub async fn free(&self, source_lang: &str, target_lang: &str) -> bool {
        self.registry.free(source_lang, target_lang).await
    }

    /// Flush every resident instance's cache. Returns the number of instances flushed.
    pub async fn empty_cache(&self) -> usize {
        self.registry.flush_all_caches().await
    }

    /// Back-translation augmentation.
    ///
    /// For each target language, translates `text` into it and back into the source
    /// language. Targets without both directions configured are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first engine error.
    pub async fn augment(
        &self,
        source_lang: &str,
        target_langs: &[String],
        text: &str,
    ) -> std::result::Result<BTreeMap<String, String>, EngineError> {
        let source = canonical_language(source_lang);
        let mut augmentations = BTreeMap::new();

        for target_lang in target_langs {
            let forward = LanguagePair::new(&source, target_lang);
            if !self.catalog.supports(&forward) {
                info!(pair = %forward, "Skipping augmentation: forward translation does not exist");
                continue;
            }
            let backward = forward.reversed();
            if !self.catalog.supports(&backward) {
                info!(pair = %backward, "Skipping augmentation: backward translation does not exist");
                continue;
            }

            let translated = self.translate(&forward.source, &forward.target, text).await?;
            let restored = self.translate(&backward.source, &backward.target, &translated).await?;
            augmentations.insert(forward.target, restored);
        }

        Ok(augmentations)
    }

    /// Registry and per-instance statistics.
    pub async fn stats(&self) -> ServiceStats {
        ServiceStats { registry: self.registry.stats(), instances: self.registry.snapshots().await }
    }

    /// Free every resident instance and refuse to construct new ones.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babel_models::ModelArtifact;

    fn service() -> TranslationService {
        let catalog = ModelCatalog::from_entries([
            (LanguagePair::new("heb", "arb"), ModelArtifact::new("opus-mt-he-ar").with_special_token("ara")),
            (LanguagePair::new("arb", "heb"), ModelArtifact::new("opus-mt-ar-he").with_special_token("heb")),
            (LanguagePair::new("heb", "eng"), ModelArtifact::new("opus-mt-he-en")),
        ]);
        TranslationService::with_catalog(Arc::new(catalog), &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_translate_single_matches_list() {
        let service = service();

        let single = service.translate("he", "ar", "shalom").await.unwrap();
        let list = service.translate_list("heb", "arb", &["shalom".to_string()]).await.unwrap();

        assert_eq!(single, "[arb] shalom");
        assert_eq!(list, vec![single]);
    }

    #[tokio::test]
    async fn test_translate_unsupported_pair() {
        let service = service();
        let err = service.translate("eng", "heb", "hello").await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedPair { .. }));
    }

    #[tokio::test]
    async fn test_free_and_empty_cache() {
        let service = service();
        assert!(!service.free("heb", "arb").await);

        service.translate("heb", "arb", "shalom").await.unwrap();
        assert_eq!(service.empty_cache().await, 1);
        assert_eq!(service.stats().await.registry.resident, 1);

        assert!(service.free("he", "ar").await);
        assert_eq!(service.empty_cache().await, 0);
        assert_eq!(service.stats().await.registry.resident, 0);
    }

    #[tokio::test]
    async fn test_augment_skips_one_way_targets() {
        let service = service();

        let augmentations = service
            .augment("he", &["ar".to_string(), "eng".to_string(), "fin".to_string()], "shalom")
            .await
            .unwrap();

        assert_eq!(augmentations.len(), 1);
        assert_eq!(augmentations["arb"], "[heb] [arb] shalom");
    }

    #[tokio::test]
    async fn test_catalog_queries() {
        let service = service();

        assert_eq!(service.models(), vec!["opus-mt-ar-he", "opus-mt-he-ar", "opus-mt-he-en"]);
        assert_eq!(service.pairs().len(), 3);
        assert_eq!(service.supported_translations(), vec!["arb <--> heb", "heb --> eng"]);
    }

    #[tokio::test]
    async fn test_stats_lists_instances() {
        let service = service();
        service.translate_list("heb", "eng", &["a".to_string(), "a".to_string()]).await.unwrap();

        let stats = service.stats().await;

        assert_eq!(stats.registry.constructions, 1);
        assert_eq!(stats.instances.len(), 1);
        assert_eq!(stats.instances[0].cache.size, 1);
        assert_eq!(stats.instances[0].cache.misses, 2);
    }
}
