//! Error types for Babel Core.

use babel_abstraction::EngineError;
use babel_models::{CacheConfigError, CatalogError};
use thiserror::Error;

/// Core error type for Babel operations.
#[derive(Error, Debug)]
pub enum BabelError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Invalid cache settings
    #[error("Cache configuration error: {0}")]
    CacheConfig(#[from] CacheConfigError),

    /// Model catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Babel operations.
pub type Result<T> = std::result::Result<T, BabelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_babel_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let babel_err: BabelError = io_err.into();
        assert!(matches!(babel_err, BabelError::Io(_)));
    }

    #[test]
    fn test_babel_error_config() {
        let err = BabelError::Config("Invalid configuration".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("Invalid configuration"));
    }

    #[test]
    fn test_babel_error_engine_conversion() {
        let engine_err = EngineError::Generation("out of memory".to_string());
        let babel_err: BabelError = engine_err.into();
        match babel_err {
            BabelError::Engine(EngineError::Generation(msg)) => assert_eq!(msg, "out of memory"),
            other => panic!("Expected Engine error variant, got {other:?}"),
        }
    }

    #[test]
    fn test_babel_error_catalog_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let babel_err: BabelError = CatalogError::Json(json_err).into();
        assert!(babel_err.to_string().starts_with("Catalog error"));
    }

    #[test]
    fn test_babel_error_cache_config_conversion() {
        let babel_err: BabelError = CacheConfigError::InvalidMaxEntries.into();
        assert!(babel_err.to_string().contains("greater than 0"));
    }
}
