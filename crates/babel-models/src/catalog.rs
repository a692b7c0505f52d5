//! Static model catalog mapping language pairs to trained artifacts.
//!
//! The catalog file is JSON keyed by source then target language:
//!
//! ```json
//! {
//!   "heb": { "arb": { "model_name": "opus-mt-he-ar", "special_tok": "ara" } },
//!   "arb": { "heb": { "model_name": "opus-mt-ar-he" } }
//! }
//! ```
//!
//! Language codes are canonicalized with the same rules as incoming requests.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use babel_abstraction::LanguagePair;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error reading the catalog file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The trained artifact serving one language pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact name (directory under the models root, or model id on a remote server).
    pub model_name: String,
    /// Target-language token injected in front of every input, if the model needs one.
    #[serde(rename = "special_tok", default)]
    pub special_token: Option<String>,
}

impl ModelArtifact {
    /// Creates an artifact without a special token.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self { model_name: model_name.into(), special_token: None }
    }

    /// Sets the target-language token.
    #[must_use]
    pub fn with_special_token(mut self, token: impl Into<String>) -> Self {
        self.special_token = Some(token.into());
        self
    }
}

/// A supported translation direction, as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Both `a -> b` and `b -> a` are configured.
    Bidirectional(String, String),
    /// Only `source -> target` is configured.
    OneWay(String, String),
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bidirectional(a, b) => write!(f, "{a} <--> {b}"),
            Self::OneWay(source, target) => write!(f, "{source} --> {target}"),
        }
    }
}

/// Language pair → artifact mapping, independent of which models are resident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    entries: BTreeMap<LanguagePair, ModelArtifact>,
}

impl ModelCatalog {
    /// Builds a catalog from explicit entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (LanguagePair, ModelArtifact)>,
    {
        Self { entries: entries.into_iter().collect() }
    }

    /// Parses the nested JSON catalog format.
    ///
    /// # Errors
    /// Returns `CatalogError::Json` if the document does not match the format.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, BTreeMap<String, ModelArtifact>> = serde_json::from_str(json)?;

        let mut entries = BTreeMap::new();
        for (source, targets) in raw {
            for (target, artifact) in targets {
                let pair = LanguagePair::new(&source, &target);
                if let Some(previous) = entries.insert(pair.clone(), artifact) {
                    warn!(
                        pair = %pair,
                        replaced = %previous.model_name,
                        "Catalog lists the same language pair twice; keeping the later entry"
                    );
                }
            }
        }

        debug!(pairs = entries.len(), "Parsed model catalog");
        Ok(Self { entries })
    }

    /// Loads the catalog from a JSON file.
    ///
    /// # Errors
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// The artifact configured for `pair`, if any.
    pub fn artifact(&self, pair: &LanguagePair) -> Option<&ModelArtifact> {
        self.entries.get(pair)
    }

    /// Whether `pair` has an artifact.
    pub fn supports(&self, pair: &LanguagePair) -> bool {
        self.entries.contains_key(pair)
    }

    /// Every configured pair, sorted.
    pub fn pairs(&self) -> Vec<LanguagePair> {
        self.entries.keys().cloned().collect()
    }

    /// Every configured artifact name, in pair order.
    pub fn model_names(&self) -> Vec<String> {
        self.entries.values().map(|artifact| artifact.model_name.clone()).collect()
    }

    /// Number of configured pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no pair is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapses configured pairs into client-facing directions.
    ///
    /// A pair whose reverse is also configured is reported once as bidirectional,
    /// with the languages in lexical order.
    pub fn directions(&self) -> Vec<Direction> {
        self.entries
            .keys()
            .filter_map(|pair| {
                if self.entries.contains_key(&pair.reversed()) {
                    (pair.source < pair.target)
                        .then(|| Direction::Bidirectional(pair.source.clone(), pair.target.clone()))
                } else {
                    Some(Direction::OneWay(pair.source.clone(), pair.target.clone()))
                }
            })
            .collect()
    }
}
