//! Configuration module for Babel Core.
//!
//! Configuration is read from TOML. Every section and field has a default, so an empty
//! file (or no file at all) yields a working mock-backed server on `127.0.0.1:8000`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use babel_abstraction::Device;
use babel_models::{BackendKind, CacheConfig, EngineBackend, RegistryConfig};
use serde::Deserialize;

use crate::error::{BabelError, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "BABEL_CONFIG";

/// Configuration file looked up in the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "babel.toml";

/// Server configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// The address to bind the HTTP server to.
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

fn default_address() -> SocketAddr {
    // This is a compile-time constant, so expect is safe
    "127.0.0.1:8000".parse().expect("valid default address")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: default_address() }
    }
}

/// Model configuration section in config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ModelsConfig {
    /// Path of the JSON catalog mapping language pairs to model artifacts.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Engine backend (mock, remote).
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Inference server base URL (required for the remote backend).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Device new model instances are placed on.
    #[serde(default)]
    pub device: Device,
    /// Per-instance translation cache.
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("translator_config.json")
}

fn default_backend() -> String {
    "mock".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            backend: default_backend(),
            endpoint: None,
            device: Device::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ModelsConfig {
    /// Resolve the configured backend.
    ///
    /// # Errors
    /// Returns `BabelError::Config` for an unknown backend, or a remote backend
    /// without an endpoint.
    pub fn engine_backend(&self) -> Result<EngineBackend> {
        let kind = BackendKind::from_str(&self.backend).map_err(|()| {
            BabelError::Config(format!("Unrecognized engine backend: {}", self.backend))
        })?;

        match kind {
            BackendKind::Mock => Ok(EngineBackend::Mock),
            BackendKind::Remote => {
                let base_url = self.endpoint.clone().ok_or_else(|| {
                    BabelError::Config("models.endpoint is required for the remote backend".to_string())
                })?;
                Ok(EngineBackend::Remote { base_url })
            }
        }
    }

    /// Registry settings derived from this section.
    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig { default_device: self.device, cache: self.cache.clone() }
    }
}

/// Root configuration for Babel.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Model configuration.
    #[serde(default)]
    pub models: ModelsConfig,
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the file named by `BABEL_CONFIG`, else `babel.toml` in
    /// the working directory, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read or parsed.
    #[allow(clippy::disallowed_methods)] // env::var is needed to locate the config file
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or the values are invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.models.cache.validate()?;
        self.models.engine_backend()?;
        Ok(())
    }
}
