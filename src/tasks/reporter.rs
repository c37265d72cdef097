//! Stats Reporter Task
//!
//! Background task that periodically logs cache statistics.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::SharedCache;

/// Spawns a background task that periodically logs cache statistics.
///
/// The task sleeps for the given interval between reports and only holds
/// the read lock long enough to snapshot the stats. An interval of zero is
/// treated as one second.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let state = AppState::from_config(&config)?;
/// let reporter = spawn_stats_reporter(state.cache.clone(), 60);
/// // Later, during shutdown:
/// reporter.abort();
/// ```
pub fn spawn_stats_reporter(cache: SharedCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        let mut last_evictions = 0;
        loop {
            tokio::time::sleep(interval).await;

            let (stats, max_memory_bytes) = {
                let cache_guard = cache.read().await;
                (cache_guard.stats(), cache_guard.max_memory_bytes())
            };

            if stats.evictions > last_evictions || stats.total_entries > 0 {
                info!(
                    entries = stats.total_entries,
                    memory_usage = stats.memory_usage,
                    max_memory_bytes,
                    evictions = stats.evictions,
                    rejections = stats.rejections,
                    hit_rate = stats.hit_rate(),
                    "Cache stats"
                );
            } else {
                debug!("Cache stats: empty, no new evictions");
            }
            last_evictions = stats.evictions;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppState;
    use crate::config::CacheConfig;
    use serde_json::json;

    fn shared_cache() -> SharedCache {
        AppState::from_cache_config(CacheConfig::new().max_items(10).max_memory_bytes(1024))
            .unwrap()
            .cache
    }

    #[tokio::test]
    async fn test_reporter_leaves_cache_untouched() {
        let cache = shared_cache();
        cache
            .write()
            .await
            .set("key".to_string(), json!("value"));

        let handle = spawn_stats_reporter(cache.clone(), 1);

        // Let at least one report run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let mut cache_guard = cache.write().await;
            assert_eq!(cache_guard.get("key"), Some(&json!("value")));
            assert_eq!(cache_guard.len(), 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_reporter_can_be_aborted() {
        let handle = spawn_stats_reporter(shared_cache(), 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
