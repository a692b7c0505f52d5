//! Engine abstraction layer for Babel.
//!
//! This module defines the capability every translation backend provides, together with
//! the small value types shared by the cache, the registry and the service layer.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when constructing or driving a translation engine.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineError {
    /// No trained artifact is configured for the requested language pair.
    #[error("Unsupported language pair: {source_lang} -> {target_lang}")]
    UnsupportedPair {
        /// Canonical source language code.
        source_lang: String,
        /// Canonical target language code.
        target_lang: String,
    },

    /// The engine failed while generating translations (e.g. resource exhaustion).
    #[error("Generation Error: {0}")]
    Generation(String),

    /// The engine returned a different number of outputs than it was given inputs.
    #[error("Batch Mismatch: expected {expected} outputs, got {actual}")]
    BatchMismatch {
        /// Number of inputs sent to the engine.
        expected: usize,
        /// Number of outputs the engine produced.
        actual: usize,
    },

    /// The device string is invalid or the engine cannot be placed on it.
    #[error("Device Error: {0}")]
    Device(String),

    /// The engine was released by a free operation and can no longer serve requests.
    #[error("Engine for {0} has been released")]
    Released(String),

    /// The registry has been shut down and no longer constructs instances.
    #[error("Model registry is shutting down")]
    ShuttingDown,
}

impl EngineError {
    /// Builds the configuration error for an unsupported pair.
    #[must_use]
    pub fn unsupported(pair: &LanguagePair) -> Self {
        Self::UnsupportedPair { source_lang: pair.source.clone(), target_lang: pair.target.clone() }
    }
}

/// Maps alternate language codes to the three-letter codes used internally.
///
/// Codes are trimmed and lower-cased first; unknown codes pass through.
#[must_use]
pub fn canonical_language(code: &str) -> String {
    let code = code.trim().to_lowercase();
    match code.as_str() {
        "he" => "heb".to_string(),
        "ar" | "ara" => "arb".to_string(),
        "en" => "eng".to_string(),
        _ => code,
    }
}

/// An ordered (source, target) language combination identifying one directional model.
///
/// Both codes are canonicalized on construction, so `("he", "ar")` and `("heb", "arb")`
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LanguagePair {
    /// Canonical source language code.
    pub source: String,
    /// Canonical target language code.
    pub target: String,
}

impl LanguagePair {
    /// Creates a pair from raw language codes, canonicalizing both.
    #[must_use]
    pub fn new(source: &str, target: &str) -> Self {
        Self { source: canonical_language(source), target: canonical_language(target) }
    }

    /// Returns the pair translating in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self { source: self.target.clone(), target: self.source.clone() }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.source, self.target)
    }
}

/// Where an engine's weights live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    /// Host memory.
    #[default]
    Cpu,
    /// An accelerator, by ordinal.
    Cuda(u32),
}

impl Device {
    /// Whether this device holds accelerator memory that must be released on free.
    #[must_use]
    pub const fn is_accelerator(self) -> bool {
        matches!(self, Self::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}

impl FromStr for Device {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|ordinal| ordinal.parse().ok())
                .map(Self::Cuda)
                .ok_or_else(|| EngineError::Device(format!("Unrecognized device: {s}"))),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

/// The capability performing text-to-text inference for one language pair.
///
/// Implementations own whatever resources inference needs (tokenizer, weights, HTTP
/// client). All engines must be `Send + Sync` so instances can be shared across requests.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// The language pair this engine is bound to.
    fn pair(&self) -> &LanguagePair;

    /// Applies model-specific input preparation (target tokens, sentence markers).
    fn preprocess(&self, text: &str) -> String {
        text.to_string()
    }

    /// Translates a batch of preprocessed inputs.
    ///
    /// The output must correspond positionally to `batch`.
    ///
    /// # Errors
    /// Returns an `EngineError` if inference fails.
    async fn generate(&self, batch: &[String]) -> Result<Vec<String>, EngineError>;

    /// The device the engine currently runs on.
    fn device(&self) -> Device;

    /// Moves the engine and all of its weights to `device`.
    ///
    /// # Errors
    /// Returns `EngineError::Device` if the placement is not possible.
    fn to_device(&mut self, device: Device) -> Result<(), EngineError>;

    /// Releases engine resources. Called once, after the engine has been moved to CPU.
    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_language_aliases() {
        assert_eq!(canonical_language("he"), "heb");
        assert_eq!(canonical_language("ar"), "arb");
        assert_eq!(canonical_language("ara"), "arb");
        assert_eq!(canonical_language("en"), "eng");
        assert_eq!(canonical_language(" EN "), "eng");
        assert_eq!(canonical_language("fin"), "fin");
    }

    #[test]
    fn test_language_pair_normalizes() {
        assert_eq!(LanguagePair::new("he", "ar"), LanguagePair::new("heb", "arb"));
        assert_eq!(LanguagePair::new("he", "ara").to_string(), "heb_arb");
        assert_eq!(LanguagePair::new("heb", "eng").reversed(), LanguagePair::new("en", "he"));
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:2".parse::<Device>().unwrap(), Device::Cuda(2));
        assert!(matches!("tpu".parse::<Device>(), Err(EngineError::Device(_))));
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn test_device_serde_roundtrip_through_strings() {
        let device: Device = serde_json::from_str(r#""cuda:1""#).unwrap();
        assert_eq!(device, Device::Cuda(1));
        assert_eq!(serde_json::to_string(&Device::Cpu).unwrap(), r#""cpu""#);
        assert!(device.is_accelerator());
        assert!(!Device::Cpu.is_accelerator());
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::unsupported(&LanguagePair::new("xyz", "qrs"));
        assert_eq!(err.to_string(), "Unsupported language pair: xyz -> qrs");

        let err = EngineError::BatchMismatch { expected: 3, actual: 2 };
        assert!(err.to_string().contains("expected 3"));
    }
}
