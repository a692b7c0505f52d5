//! Observability types for the registry.

use babel_abstraction::{Device, LanguagePair};
use serde::Serialize;

use crate::cache::CacheStats;

/// Registry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Instances constructed since start.
    pub constructions: u64,
    /// Instances released by free or shutdown.
    pub frees: u64,
    /// Cache flushes across all instances.
    pub flushes: u64,
    /// Instances currently resident.
    pub resident: usize,
}

/// Point-in-time view of one resident instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSnapshot {
    /// The instance's language pair.
    pub pair: LanguagePair,
    /// Current device placement.
    pub device: Device,
    /// Cache counters.
    pub cache: CacheStats,
}
