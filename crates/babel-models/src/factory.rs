//! Engine factory for binding translation engines to language pairs.
//!
//! The registry never constructs engines directly; it asks an [`EngineFactory`], which
//! decides whether a pair is supported and which backend serves it.

use std::str::FromStr;
use std::sync::Arc;

use babel_abstraction::{EngineError, LanguagePair, TranslationEngine};
use tracing::{debug, error};

use crate::catalog::ModelCatalog;
use crate::{MockEngine, RemoteEngine};

/// Constructs engines for language pairs.
///
/// Construction may be expensive (loading weights) and is run on a blocking thread.
pub trait EngineFactory: Send + Sync {
    /// Every pair this factory can serve, from static configuration.
    fn supported_pairs(&self) -> Vec<LanguagePair>;

    /// Whether `pair` can be served.
    fn supports(&self, pair: &LanguagePair) -> bool {
        self.supported_pairs().contains(pair)
    }

    /// Binds a fresh engine for `pair`.
    ///
    /// # Errors
    /// Returns `EngineError::UnsupportedPair` if no artifact is configured for `pair`.
    fn create(&self, pair: &LanguagePair) -> Result<Box<dyn TranslationEngine>, EngineError>;
}

/// Backend kind enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Deterministic offline engine.
    Mock,
    /// Remote inference server.
    Remote,
}

impl FromStr for BackendKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "remote" | "http" => Ok(Self::Remote),
            _ => Err(()),
        }
    }
}

/// Which engine implementation serves catalog artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineBackend {
    /// Use [`MockEngine`].
    Mock,
    /// Use [`RemoteEngine`] against the given server.
    Remote {
        /// Base URL of the inference server.
        base_url: String,
    },
}

/// Factory binding engines from a [`ModelCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogEngineFactory {
    catalog: Arc<ModelCatalog>,
    backend: EngineBackend,
}

impl CatalogEngineFactory {
    /// Creates a factory serving `catalog` with `backend`.
    #[must_use]
    pub fn new(catalog: Arc<ModelCatalog>, backend: EngineBackend) -> Self {
        Self { catalog, backend }
    }

    /// The catalog this factory serves.
    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }
}

impl EngineFactory for CatalogEngineFactory {
    fn supported_pairs(&self) -> Vec<LanguagePair> {
        self.catalog.pairs()
    }

    fn supports(&self, pair: &LanguagePair) -> bool {
        self.catalog.supports(pair)
    }

    fn create(&self, pair: &LanguagePair) -> Result<Box<dyn TranslationEngine>, EngineError> {
        let artifact = self.catalog.artifact(pair).ok_or_else(|| {
            error!(pair = %pair, "No model artifact configured");
            EngineError::unsupported(pair)
        })?;

        debug!(
            pair = %pair,
            model = %artifact.model_name,
            backend = ?self.backend,
            "Binding engine"
        );

        match &self.backend {
            EngineBackend::Mock => Ok(Box::new(MockEngine::with_artifact(pair.clone(), artifact))),
            EngineBackend::Remote { base_url } => {
                Ok(Box::new(RemoteEngine::new(pair.clone(), artifact.clone(), base_url.clone())?))
            }
        }
    }
}
