//! Translation caching for model instances.
//!
//! Every model instance owns one bounded cache mapping source text to target text.
//! The cache resolves a batch by serving known texts directly and sending only the
//! remainder to the engine, then merges both back into request order.

mod cache;
pub mod config;
pub mod types;

pub use cache::TranslationCache;
pub use config::{CacheConfig, CacheConfigError};
pub use types::{CacheEntry, CacheStats};
