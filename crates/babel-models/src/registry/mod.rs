//! Model-instance registry.
//!
//! The registry keeps at most one resident [`ModelInstance`] per language pair,
//! creating instances lazily on first use and releasing them on explicit free.

mod config;
mod instance;
mod registry;
mod types;

pub use config::RegistryConfig;
pub use instance::ModelInstance;
pub use registry::ModelRegistry;
pub use types::{InstanceSnapshot, RegistryStats};
