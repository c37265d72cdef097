//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{Insertion, LruCache};
use crate::config::{CacheConfig, Config};
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HasResponse, HealthResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Cache of JSON values keyed by string, as served over HTTP.
pub type JsonCache = LruCache<String, Value>;

/// A cache instance behind the single lock that serializes all access.
pub type SharedCache = Arc<RwLock<JsonCache>>;

/// Application state shared across all handlers.
///
/// Contains the cache wrapped in Arc<RwLock<>>. Every operation on the cache
/// goes through this one lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: JsonCache) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from server configuration.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidConfig` if the configured limits are invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_cache_config(config.cache_config())
    }

    pub fn from_cache_config(config: CacheConfig<Value>) -> Result<Self> {
        LruCache::new(config).map(Self::new)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair. Responds 413 if the value can never fit.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    match cache.insert(req.key.clone(), req.value) {
        Insertion::Inserted => Ok(Json(SetResponse::new(req.key, false))),
        Insertion::Updated => Ok(Json(SetResponse::new(req.key, true))),
        Insertion::Rejected { size, limit } => Err(CacheError::ValueTooLarge { size, limit }),
    }
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a hit reorders the recency list and updates stats
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => {
            let value = value.clone();
            Ok(Json(GetResponse::new(key, value)))
        }
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /has/:key
///
/// Reports whether a key is present without refreshing it.
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let cache = state.cache.read().await;
    let exists = cache.contains(&key);
    Json(HasResponse::new(key, exists))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if cache.delete(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /clear
///
/// Discards every entry.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.len();
    cache.clear();
    Json(ClearResponse::new(removed))
}

/// Handler for GET /stats
///
/// Returns current cache statistics and limits.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    let stats = cache.stats();

    Json(StatsResponse::new(
        &stats,
        cache.max_items(),
        cache.max_memory_bytes(),
    ))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
