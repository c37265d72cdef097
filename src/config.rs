//! Configuration Module
//!
//! Cache limits for library users, plus server configuration loaded from
//! environment variables.

use std::env;
use std::fmt;
use std::fs;
use std::sync::Arc;

use tracing::warn;

use crate::cache::SizeFn;
use crate::error::{CacheError, Result};

// == Memory Probe ==
/// Source of the host's available memory, used to derive a default byte limit.
pub trait MemoryProbe {
    /// Returns currently available memory in bytes, if it can be determined.
    fn available_bytes(&self) -> Option<u64>;
}

/// Reads `MemAvailable` from `/proc/meminfo`.
///
/// Reports nothing on hosts without procfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn available_bytes(&self) -> Option<u64> {
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        parse_mem_available(&meminfo)
    }
}

/// Probe returning a fixed amount, for deterministic setups and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn available_bytes(&self) -> Option<u64> {
        Some(self.0)
    }
}

/// Extracts the `MemAvailable:` line (in kB) and converts it to bytes.
fn parse_mem_available(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb.saturating_mul(1024))
}

// == Cache Limits ==
/// Validated limits a cache runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    /// Maximum number of entries, if bounded
    pub max_items: Option<usize>,
    /// Maximum total estimated size in bytes
    pub max_memory_bytes: usize,
}

// == Cache Config ==
/// Construction options for an [`LruCache`](crate::cache::LruCache).
///
/// At least one of `max_items` and `max_memory_bytes` must be set. When only
/// `max_items` is given, the byte limit defaults to half of the memory the
/// [`MemoryProbe`] reports as available.
pub struct CacheConfig<V> {
    /// Maximum number of entries
    pub max_items: Option<usize>,
    /// Maximum total estimated size in bytes
    pub max_memory_bytes: Option<usize>,
    /// Replaces the built-in size heuristic when set
    pub size_calculator: Option<SizeFn<V>>,
}

impl<V> CacheConfig<V> {
    // == Constructor ==
    /// Creates an empty configuration. Set at least one limit before use.
    pub fn new() -> Self {
        Self {
            max_items: None,
            max_memory_bytes: None,
            size_calculator: None,
        }
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn max_memory_bytes(mut self, max_memory_bytes: usize) -> Self {
        self.max_memory_bytes = Some(max_memory_bytes);
        self
    }

    /// Sets a custom size function, used instead of the built-in heuristic.
    pub fn size_calculator<F>(mut self, f: F) -> Self
    where
        F: Fn(&V) -> usize + Send + Sync + 'static,
    {
        self.size_calculator = Some(Arc::new(f));
        self
    }

    // == Resolve Limits ==
    /// Validates the configured limits and fills in the default byte limit.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] if a limit is zero or no limit
    /// is set at all.
    pub fn resolve_limits(&self, probe: &dyn MemoryProbe) -> Result<CacheLimits> {
        if self.max_items == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_items must be a positive integer".to_string(),
            ));
        }
        if self.max_memory_bytes == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_memory_bytes must be a positive integer".to_string(),
            ));
        }

        let max_memory_bytes = match (self.max_items, self.max_memory_bytes) {
            (_, Some(bytes)) => bytes,
            (Some(_), None) => default_memory_limit(probe),
            (None, None) => {
                return Err(CacheError::InvalidConfig(
                    "at least one of max_items or max_memory_bytes must be set".to_string(),
                ))
            }
        };

        Ok(CacheLimits {
            max_items: self.max_items,
            max_memory_bytes,
        })
    }
}

impl<V> Default for CacheConfig<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for CacheConfig<V> {
    fn clone(&self) -> Self {
        Self {
            max_items: self.max_items,
            max_memory_bytes: self.max_memory_bytes,
            size_calculator: self.size_calculator.clone(),
        }
    }
}

impl<V> fmt::Debug for CacheConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max_items", &self.max_items)
            .field("max_memory_bytes", &self.max_memory_bytes)
            .field("size_calculator", &self.size_calculator.is_some())
            .finish()
    }
}

/// Half of the probe's available memory, never below one byte.
///
/// Falls back to an unbounded byte limit if the probe reports nothing; the
/// item limit still bounds the cache in that case.
fn default_memory_limit(probe: &dyn MemoryProbe) -> usize {
    match probe.available_bytes() {
        Some(bytes) => usize::try_from(bytes / 2).unwrap_or(usize::MAX).max(1),
        None => {
            warn!("Available memory unknown; byte limit defaults to unbounded");
            usize::MAX
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_items: Option<usize>,
    /// Maximum estimated memory in bytes, None = derive from available memory
    pub max_memory_bytes: Option<usize>,
    /// HTTP server port
    pub server_port: u16,
    /// Interval in seconds between stats log lines
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ITEMS` - Maximum cache entries (default: 1000)
    /// - `MAX_MEMORY_BYTES` - Maximum estimated bytes (default: half of available memory)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STATS_INTERVAL` - Stats reporting frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_items: env::var("MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.max_items),
            max_memory_bytes: env::var("MAX_MEMORY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            stats_interval: env::var("STATS_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stats_interval),
        }
    }

    /// Builds the cache construction options described by this config.
    pub fn cache_config<V>(&self) -> CacheConfig<V> {
        CacheConfig {
            max_items: self.max_items,
            max_memory_bytes: self.max_memory_bytes,
            size_calculator: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: Some(1000),
            max_memory_bytes: None,
            server_port: 3000,
            stats_interval: 60,
        }
    }
}
