//! The file storage façade
//!
//! Reads use the cache first and fall back to the record store; writes,
//! deletes and URL lookups always go to the record store and then refresh or
//! invalidate the cache before returning.
//!
//! No locking spans operations. Two concurrent saves to one name race at the
//! record store, and the cached snapshot ends up holding whichever write-through
//! ran last, which need not be the write that won at the store. A change made
//! to the record store without going through a façade can be served stale for
//! up to the cache TTL.

use crate::cache::{CacheBackend, CacheOverlay, MemoryCacheBackend};
use crate::config::{CacheSelection, Config};
use crate::error::{FileStorageError, Result};
use crate::key::{derive_key, normalize_name};
use crate::store::RecordStore;
use crate::types::{BlobRecord, CacheSnapshot, CacheStats};
use chrono::{DateTime, SubsecRound, Utc};
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tracing::{debug, info, warn};

/// Current time at the precision the record store persists (microseconds),
/// so a cached snapshot carries the same timestamps a store read would.
fn store_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Readable content of a stored file, as returned by [`FileStorage::open`]
#[derive(Debug)]
pub struct BlobReader {
    name: String,
    inner: Cursor<Arc<[u8]>>,
}

impl BlobReader {
    fn new(name: String, data: Arc<[u8]>) -> Self {
        Self {
            name,
            inner: Cursor::new(data),
        }
    }

    /// Normalized name of the opened file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total content length, independent of the read position
    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// Whole content, independent of the read position
    pub fn bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }
}

impl AsyncRead for BlobReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl std::io::Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        std::io::Read::read(&mut self.inner, buf)
    }
}

struct FileStorageInner {
    store: Arc<dyn RecordStore>,
    cache: CacheOverlay,
    base_url: String,
    owner: String,
}

/// File storage backed by a record store, with an optional cache overlay
#[derive(Clone)]
pub struct FileStorage {
    inner: Arc<FileStorageInner>,
}

impl FileStorage {
    /// Build a façade, resolving the cache backend named in `config`.
    ///
    /// An unknown or unreachable cache backend is logged and the façade runs
    /// uncached; construction itself never fails.
    pub async fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        let backend: Option<Arc<dyn CacheBackend>> = match config.cache_selection() {
            CacheSelection::Disabled => {
                info!("No cache for file storage configured");
                None
            }
            CacheSelection::Memory => {
                let global: Arc<dyn CacheBackend> =
                    MemoryCacheBackend::global(config.cache_capacity);
                Some(global)
            }
            CacheSelection::Unknown(name) => {
                let err = FileStorageError::AdapterUnavailable(format!(
                    "unknown cache backend '{}'",
                    name
                ));
                warn!(error = %err, "Running file storage without cache");
                None
            }
        };

        Self::with_cache_backend(store, backend, config).await
    }

    /// Build a façade over an explicit cache backend (or none).
    pub async fn with_cache_backend(
        store: Arc<dyn RecordStore>,
        backend: Option<Arc<dyn CacheBackend>>,
        config: &Config,
    ) -> Self {
        let cache = match backend {
            Some(backend) => CacheOverlay::attach(backend, config.cache_ttl())
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Running file storage without cache");
                    CacheOverlay::Disabled
                }),
            None => CacheOverlay::Disabled,
        };

        Self {
            inner: Arc::new(FileStorageInner {
                store,
                cache,
                base_url: config.base_url.clone(),
                owner: config.owner.clone(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn owner(&self) -> &str {
        &self.inner.owner
    }

    pub fn is_cached(&self) -> bool {
        self.inner.cache.is_enabled()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Open a stored file for reading
    pub async fn open(&self, name: &str) -> Result<BlobReader> {
        let snapshot = self.resolve_read_only(name).await?;
        Ok(BlobReader::new(normalize_name(name), snapshot.data.clone()))
    }

    /// Store the full content of `content` under `name`, creating the record
    /// if needed. Returns the normalized name.
    ///
    /// The upload is buffered in memory before anything is written.
    pub async fn save<R>(&self, name: &str, mut content: R) -> Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let name = normalize_name(name);

        let mut data = Vec::new();
        content.read_to_end(&mut data).await?;

        let mut record = match self.resolve_read_write(&name).await {
            Ok(record) => record,
            Err(FileStorageError::NotFound(_)) => {
                debug!(name = %name, owner = %self.inner.owner, "Creating file record");
                self.inner
                    .store
                    .create(&name, &self.inner.owner, Vec::new(), store_now())
                    .await?
            }
            Err(e) => return Err(e),
        };

        record.set_content(data, store_now());
        self.inner.store.update(&record).await?;
        self.refresh_cache(&record).await;

        debug!(name = %name, size = record.size, "Saved file");
        Ok(name)
    }

    pub async fn save_bytes(&self, name: &str, data: &[u8]) -> Result<String> {
        self.save(name, data).await
    }

    /// Delete a stored file. Deleting an unknown name fails with `NotFound`.
    pub async fn delete(&self, name: &str) -> Result<()> {
        debug!(name = %name, "Delete called");
        let record = self.resolve_read_write(name).await?;
        self.inner.store.delete(&record).await?;
        self.inner.cache.delete(&derive_key(name)).await;
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        debug!(name = %name, "Exists called");
        match self.resolve_read_only(name).await {
            Ok(_) => Ok(true),
            Err(FileStorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn size(&self, name: &str) -> Result<u64> {
        Ok(self.resolve_read_only(name).await?.size)
    }

    pub async fn created_time(&self, name: &str) -> Result<DateTime<Utc>> {
        Ok(self.resolve_read_only(name).await?.created)
    }

    pub async fn modified_time(&self, name: &str) -> Result<DateTime<Utc>> {
        Ok(self.resolve_read_only(name).await?.modified)
    }

    /// Last access time is not tracked by the record store
    pub async fn accessed_time(&self, _name: &str) -> Result<DateTime<Utc>> {
        Err(FileStorageError::Unsupported("accessed_time"))
    }

    /// Public URL of a stored file, `None` if it does not exist
    ///
    /// Always consults the record store so the UUID is current.
    pub async fn url(&self, name: &str) -> Result<Option<String>> {
        match self.resolve_read_write(name).await {
            Ok(record) => Ok(Some(format!("{}{}", self.inner.base_url, record.uuid))),
            Err(FileStorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cache first, record store on miss
    async fn resolve_read_only(&self, name: &str) -> Result<Arc<CacheSnapshot>> {
        if let Some(snapshot) = self.inner.cache.get(&derive_key(name)).await {
            return Ok(snapshot);
        }

        let record = self.inner.store.get_by_name(&normalize_name(name)).await?;
        Ok(self.refresh_cache(&record).await)
    }

    /// Record store only; refreshes the cache on success
    async fn resolve_read_write(&self, name: &str) -> Result<BlobRecord> {
        let record = self.inner.store.get_by_name(&normalize_name(name)).await?;
        self.refresh_cache(&record).await;
        Ok(record)
    }

    async fn refresh_cache(&self, record: &BlobRecord) -> Arc<CacheSnapshot> {
        let snapshot = Arc::new(CacheSnapshot::from(record));
        self.inner
            .cache
            .set(&derive_key(&record.name), snapshot.clone())
            .await;
        snapshot
    }
}
