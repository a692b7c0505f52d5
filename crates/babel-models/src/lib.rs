//! Model instances, caching and engines for Babel.
//!
//! This crate provides the translation cache, the model-instance registry and concrete
//! implementations of the `TranslationEngine` trait.
//!
//! # Supported Backends
//!
//! - **Mock**: Deterministic offline engine for testing and development
//! - **Remote**: Batched HTTP calls to an inference server hosting the trained artifacts

pub mod cache;
pub mod catalog;
pub mod factory;
pub mod preprocess;
pub mod registry;
pub mod remote;

use async_trait::async_trait;
use babel_abstraction::{Device, EngineError, LanguagePair, TranslationEngine};
use tracing::debug;

pub use cache::{CacheConfig, CacheConfigError, CacheEntry, CacheStats, TranslationCache};
pub use catalog::{CatalogError, Direction, ModelArtifact, ModelCatalog};
pub use factory::{BackendKind, CatalogEngineFactory, EngineBackend, EngineFactory};
pub use registry::{InstanceSnapshot, ModelInstance, ModelRegistry, RegistryConfig, RegistryStats};
pub use remote::RemoteEngine;

/// A mock implementation of the `TranslationEngine` trait for testing and demonstration.
///
/// "Translates" by tagging the decoded input with the target language, e.g.
/// `shalom` → `[arb] shalom`.
#[derive(Debug)]
pub struct MockEngine {
    pair: LanguagePair,
    special_token: Option<String>,
    device: Device,
    released: bool,
}

impl MockEngine {
    /// Creates a new `MockEngine` for the given pair.
    #[must_use]
    pub const fn new(pair: LanguagePair) -> Self {
        Self { pair, special_token: None, device: Device::Cpu, released: false }
    }

    /// Creates a `MockEngine` that preprocesses like the real artifact would.
    #[must_use]
    pub fn with_artifact(pair: LanguagePair, artifact: &ModelArtifact) -> Self {
        Self { special_token: artifact.special_token.clone(), ..Self::new(pair) }
    }

    /// Whether `release` has been called.
    pub const fn is_released(&self) -> bool {
        self.released
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    fn preprocess(&self, text: &str) -> String {
        preprocess::prepare_input(self.special_token.as_deref(), text)
    }

    async fn generate(&self, batch: &[String]) -> Result<Vec<String>, EngineError> {
        if self.released {
            return Err(EngineError::Released(self.pair.to_string()));
        }

        debug!(
            pair = %self.pair,
            device = %self.device,
            batch_size = batch.len(),
            "MockEngine generating translations"
        );

        Ok(batch
            .iter()
            .map(|input| format!("[{}] {}", self.pair.target, preprocess::strip_markers(input)))
            .collect())
    }

    fn device(&self) -> Device {
        self.device
    }

    fn to_device(&mut self, device: Device) -> Result<(), EngineError> {
        self.device = device;
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}
