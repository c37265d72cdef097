//! boundcache - An in-memory LRU cache with joint item and memory limits
//!
//! The [`cache`] module holds the engine: a recency-ordered arena list, a
//! key lookup table and a size estimator, bounded by an optional item count
//! and an estimated byte budget. The [`api`] module serves one cache instance
//! over HTTP behind a single lock.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Insertion, LruCache, SizeEstimate};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_stats_reporter;
