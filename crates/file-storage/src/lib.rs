//! Database-backed file storage
//!
//! Stores named blobs (content, size, owner, timestamps) in a durable record
//! store instead of a filesystem. Reads go through an optional in-memory
//! cache overlay holding one-hour snapshots; writes and deletes always hit
//! the record store first and then refresh or invalidate the cache.
//!
//! Consistency is best effort: there is no locking across operations, and a
//! change applied to the record store behind the façade's back may be served
//! stale from the cache until the snapshot expires.

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod storage;
pub mod store;
pub mod types;

pub use cache::{CacheBackend, CacheError, CacheOverlay, MemoryCacheBackend};
pub use config::{CacheSelection, Config};
pub use error::{FileStorageError, Result};
pub use key::{derive_key, normalize_name};
pub use storage::{BlobReader, FileStorage};
pub use store::{MemoryRecordStore, PgRecordStore, RecordStore};
pub use types::{BlobRecord, CacheSnapshot, CacheStats};
