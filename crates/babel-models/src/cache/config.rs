//! Configuration for per-instance translation caches.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the translation cache owned by each model instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of (source, target) entries kept per instance (default: 1024).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    1024
}

/// Errors that can occur during cache configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheConfigError {
    /// Invalid max entries (must be > 0).
    #[error("Invalid max entries: must be greater than 0")]
    InvalidMaxEntries,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: default_max_entries() }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given capacity.
    #[must_use]
    pub const fn with_max_entries(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// Validate the cache configuration.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        self.capacity().map(|_| ())
    }

    /// The validated capacity.
    ///
    /// # Errors
    /// Returns `CacheConfigError::InvalidMaxEntries` when `max_entries` is zero.
    pub fn capacity(&self) -> Result<NonZeroUsize, CacheConfigError> {
        NonZeroUsize::new(self.max_entries).ok_or(CacheConfigError::InvalidMaxEntries)
    }
}
