//! Cache overlay: optional in-memory accelerator in front of the record store
//!
//! The overlay is resolved once when the façade is built. A disabled overlay
//! answers every lookup with a miss and ignores writes, so running without a
//! cache changes latency but never results. Backend failures are logged and
//! swallowed; the cache is strictly an optimization.

use crate::error::FileStorageError;
use crate::key::KEY_NAMESPACE;
use crate::types::{CacheSnapshot, CacheStats};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum CacheError {
    /// The backend cannot be reached at all
    Unavailable(String),
    /// The backend rejected a single operation
    Backend(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Unavailable(msg) => write!(f, "Cache unavailable: {}", msg),
            CacheError::Backend(msg) => write!(f, "Cache backend error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// Key/value accelerator holding snapshots with a per-entry TTL
///
/// Backends may be shared by several façades and by unrelated users, so
/// bulk removal is always scoped to a key prefix.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Arc<CacheSnapshot>>, CacheError>;

    async fn set(
        &self,
        key: &str,
        snapshot: Arc<CacheSnapshot>,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry whose key starts with `prefix`
    async fn clear_prefix(&self, prefix: &str) -> Result<(), CacheError>;

    /// Clear `prefix` the first time it is requested during this backend's
    /// lifetime. Returns `true` if the namespace was cleared by this call.
    async fn reset_namespace(&self, prefix: &str) -> Result<bool, CacheError>;

    /// Approximate number of live entries
    fn entry_count(&self) -> u64;
}

#[derive(Clone)]
struct TimedSnapshot {
    snapshot: Arc<CacheSnapshot>,
    ttl: Duration,
}

/// Every insert, including a refresh of an existing key, restarts the TTL
struct SnapshotExpiry;

impl Expiry<String, TimedSnapshot> for SnapshotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &TimedSnapshot,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TimedSnapshot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

static GLOBAL_MEMORY_CACHE: OnceLock<Arc<MemoryCacheBackend>> = OnceLock::new();

/// In-process cache backend built on a moka async cache
pub struct MemoryCacheBackend {
    cache: Cache<String, TimedSnapshot>,
    /// Namespaces already reset during this backend's lifetime
    reset_namespaces: Mutex<HashSet<String>>,
}

impl MemoryCacheBackend {
    /// Create a backend holding at most `max_capacity` snapshots
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(SnapshotExpiry)
            .support_invalidation_closures()
            .build();

        Self {
            cache,
            reset_namespaces: Mutex::new(HashSet::new()),
        }
    }

    /// The process-wide backend selected by the `memory` cache name.
    ///
    /// Capacity is taken from the first caller.
    pub fn global(max_capacity: u64) -> Arc<Self> {
        GLOBAL_MEMORY_CACHE
            .get_or_init(|| Arc::new(Self::new(max_capacity)))
            .clone()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Arc<CacheSnapshot>>, CacheError> {
        Ok(self.cache.get(key).await.map(|entry| entry.snapshot))
    }

    async fn set(
        &self,
        key: &str,
        snapshot: Arc<CacheSnapshot>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), TimedSnapshot { snapshot, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let prefix = prefix.to_string();
        self.cache
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn reset_namespace(&self, prefix: &str) -> Result<bool, CacheError> {
        let mut reset = self.reset_namespaces.lock().await;
        if reset.contains(prefix) {
            return Ok(false);
        }
        self.clear_prefix(prefix).await?;
        reset.insert(prefix.to_string());
        Ok(true)
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

/// Cache backend in use, with hit/miss counters
pub struct ActiveCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Either no accelerator or a configured one; fixed for the façade's lifetime
#[derive(Clone)]
pub enum CacheOverlay {
    Disabled,
    Enabled(Arc<ActiveCache>),
}

impl CacheOverlay {
    /// Put `backend` in front of the record store.
    ///
    /// Resets the file storage namespace of the backend on first use so a
    /// process never starts with snapshots it did not write. Fails with
    /// `AdapterUnavailable` if the backend cannot perform that reset.
    pub async fn attach(
        backend: Arc<dyn CacheBackend>,
        ttl: Duration,
    ) -> Result<Self, FileStorageError> {
        match backend.reset_namespace(KEY_NAMESPACE).await {
            Ok(true) => info!(namespace = KEY_NAMESPACE, "Cleared file storage cache namespace"),
            Ok(false) => debug!(namespace = KEY_NAMESPACE, "Cache namespace already reset"),
            Err(e) => return Err(FileStorageError::AdapterUnavailable(e.to_string())),
        }

        Ok(CacheOverlay::Enabled(Arc::new(ActiveCache {
            backend,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheOverlay::Enabled(_))
    }

    /// Look up a snapshot. Backend errors count as a miss.
    pub async fn get(&self, key: &str) -> Option<Arc<CacheSnapshot>> {
        let CacheOverlay::Enabled(active) = self else {
            return None;
        };

        match active.backend.get(key).await {
            Ok(Some(snapshot)) => {
                active.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit");
                Some(snapshot)
            }
            Ok(None) => {
                active.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                active.misses.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Cache lookup failed, reading from store");
                None
            }
        }
    }

    /// Store a snapshot with the overlay's TTL
    pub async fn set(&self, key: &str, snapshot: Arc<CacheSnapshot>) {
        let CacheOverlay::Enabled(active) = self else {
            return;
        };

        if let Err(e) = active.backend.set(key, snapshot, active.ttl).await {
            warn!(key = %key, error = %e, "Failed to cache file snapshot");
        }
    }

    pub async fn delete(&self, key: &str) {
        let CacheOverlay::Enabled(active) = self else {
            return;
        };

        if let Err(e) = active.backend.delete(key).await {
            warn!(key = %key, error = %e, "Failed to invalidate cached file snapshot");
        }
    }

    pub fn stats(&self) -> CacheStats {
        match self {
            CacheOverlay::Disabled => CacheStats::default(),
            CacheOverlay::Enabled(active) => CacheStats {
                enabled: true,
                entries: active.backend.entry_count(),
                hits: active.hits.load(Ordering::Relaxed),
                misses: active.misses.load(Ordering::Relaxed),
            },
        }
    }
}
