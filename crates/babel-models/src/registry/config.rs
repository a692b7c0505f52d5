//! Configuration for the model registry.

use babel_abstraction::Device;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, CacheConfigError};

/// Settings applied to every instance the registry constructs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Device new instances are placed on (default: cpu).
    #[serde(default)]
    pub default_device: Device,

    /// Per-instance cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl RegistryConfig {
    /// Validate the registry configuration.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if the cache settings are invalid.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        self.cache.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.default_device, Device::Cpu);
        assert_eq!(config.cache.max_entries, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_registry_config_deserialize() {
        let json = r#"{"default_device": "cuda:1", "cache": {"max_entries": 8}}"#;
        let config: RegistryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_device, Device::Cuda(1));
        assert_eq!(config.cache.max_entries, 8);
    }

    #[test]
    fn test_registry_config_rejects_empty_cache() {
        let config = RegistryConfig { cache: CacheConfig::with_max_entries(0), ..Default::default() };
        assert_eq!(config.validate(), Err(CacheConfigError::InvalidMaxEntries));
    }
}
