//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals
    pub misses: u64,
    /// Number of entries evicted under count or memory pressure
    pub evictions: u64,
    /// Number of insertions dropped because the value could never fit
    pub rejections: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current estimated memory usage in bytes
    pub memory_usage: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    // == Update Gauges ==
    /// Updates the entry count and memory usage snapshot.
    pub fn set_occupancy(&mut self, total_entries: usize, memory_usage: usize) {
        self.total_entries = total_entries;
        self.memory_usage = memory_usage;
    }
}
