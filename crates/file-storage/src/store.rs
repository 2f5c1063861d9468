//! Record store adapters
//!
//! The record store is the source of truth. It is looked up by exact name
//! only, and every operation is atomic for a single record; nothing here
//! coordinates across operations.

use crate::error::{FileStorageError, Result};
use crate::types::BlobRecord;
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use file_storage_db::{CreateDbFileParams, PgPool, UpdateDbFileParams};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Durable store of blob records keyed by logical name
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record, failing with `NotFound` if the name is unknown
    async fn get_by_name(&self, name: &str) -> Result<BlobRecord>;

    /// Create a record with a fresh UUID. `created_at` is also the initial
    /// modification time.
    async fn create(
        &self,
        name: &str,
        owner: &str,
        data: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<BlobRecord>;

    /// Persist `data`, `size` and `modified` of an existing record
    async fn update(&self, record: &BlobRecord) -> Result<()>;

    async fn delete(&self, record: &BlobRecord) -> Result<()>;
}

/// PostgreSQL-backed record store over the `db_files` table
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get_by_name(&self, name: &str) -> Result<BlobRecord> {
        debug!(name = %name, "Loading file record");
        file_storage_db::files::get_by_name(&self.pool, name)
            .await?
            .map(BlobRecord::from)
            .ok_or_else(|| FileStorageError::NotFound(name.to_string()))
    }

    async fn create(
        &self,
        name: &str,
        owner: &str,
        data: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<BlobRecord> {
        let uuid = Uuid::new_v4().to_string();
        let row = file_storage_db::files::create(
            &self.pool,
            &CreateDbFileParams {
                uuid: &uuid,
                name,
                owner,
                data: &data,
                created: created_at,
            },
        )
        .await?;
        debug!(name = %name, uuid = %uuid, "Created file record");
        Ok(row.into())
    }

    async fn update(&self, record: &BlobRecord) -> Result<()> {
        let touched = file_storage_db::files::update_content(
            &self.pool,
            &UpdateDbFileParams {
                uuid: &record.uuid,
                data: &record.data,
                modified: record.modified,
            },
        )
        .await?;
        if touched == 0 {
            return Err(FileStorageError::NotFound(record.name.clone()));
        }
        Ok(())
    }

    async fn delete(&self, record: &BlobRecord) -> Result<()> {
        let touched = file_storage_db::files::delete(&self.pool, &record.uuid).await?;
        if touched == 0 {
            return Err(FileStorageError::NotFound(record.name.clone()));
        }
        Ok(())
    }
}

/// Process-local record store, for tests and throwaway runs.
///
/// Timestamps are kept at microsecond precision, like a `TIMESTAMPTZ` column.
#[derive(Clone, Default)]
pub struct MemoryRecordStore(Arc<RwLock<HashMap<String, BlobRecord>>>);

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.0.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.0.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_by_name(&self, name: &str) -> Result<BlobRecord> {
        self.0
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| FileStorageError::NotFound(name.to_string()))
    }

    async fn create(
        &self,
        name: &str,
        owner: &str,
        data: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<BlobRecord> {
        let mut records = self.0.write().await;
        if records.contains_key(name) {
            return Err(FileStorageError::store(format!(
                "duplicate file name: {}",
                name
            )));
        }

        let record = BlobRecord {
            name: name.to_string(),
            uuid: Uuid::new_v4().to_string(),
            size: data.len() as u64,
            data,
            owner: owner.to_string(),
            created: created_at.trunc_subsecs(6),
            modified: created_at.trunc_subsecs(6),
        };
        records.insert(name.to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: &BlobRecord) -> Result<()> {
        let mut records = self.0.write().await;
        match records.get_mut(&record.name) {
            Some(stored) if stored.uuid == record.uuid => {
                stored.set_content(record.data.clone(), record.modified.trunc_subsecs(6));
                Ok(())
            }
            _ => Err(FileStorageError::NotFound(record.name.clone())),
        }
    }

    async fn delete(&self, record: &BlobRecord) -> Result<()> {
        let mut records = self.0.write().await;
        match records.get(&record.name) {
            Some(stored) if stored.uuid == record.uuid => {
                records.remove(&record.name);
                Ok(())
            }
            _ => Err(FileStorageError::NotFound(record.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store.get_by_name("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_assigns_uuid_and_timestamps() {
        let store = MemoryRecordStore::new();
        let now = Utc::now();
        let rec = store
            .create("a/b", "fstor", b"abc".to_vec(), now)
            .await
            .unwrap();

        assert_eq!(rec.name, "a/b");
        assert_eq!(rec.owner, "fstor");
        assert_eq!(rec.size, 3);
        assert_eq!(rec.created, now.trunc_subsecs(6));
        assert_eq!(rec.modified, now.trunc_subsecs(6));
        assert!(Uuid::parse_str(&rec.uuid).is_ok());
        assert_eq!(store.get_by_name("a/b").await.unwrap(), rec);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let store = MemoryRecordStore::new();
        let now = Utc::now();
        store.create("dup", "fstor", Vec::new(), now).await.unwrap();

        let err = store.create("dup", "fstor", Vec::new(), now).await.unwrap_err();
        assert!(matches!(err, FileStorageError::StoreFailure(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_immutable_fields() {
        let store = MemoryRecordStore::new();
        let created = Utc::now().trunc_subsecs(6);
        let original = store
            .create("f", "fstor", b"old".to_vec(), created)
            .await
            .unwrap();

        let mut changed = original.clone();
        changed.owner = "someone-else".to_string();
        changed.created = created + chrono::Duration::days(1);
        changed.set_content(b"newer".to_vec(), created + chrono::Duration::seconds(1));
        store.update(&changed).await.unwrap();

        let stored = store.get_by_name("f").await.unwrap();
        assert_eq!(stored.data, b"newer");
        assert_eq!(stored.size, 5);
        assert_eq!(stored.owner, "fstor");
        assert_eq!(stored.created, created);
        assert_eq!(stored.uuid, original.uuid);
    }

    #[tokio::test]
    async fn test_timestamps_stored_at_microsecond_precision() {
        let store = MemoryRecordStore::new();
        let created = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let rec = store.create("f", "fstor", Vec::new(), created).await.unwrap();
        assert_eq!(rec.created.timestamp_subsec_nanos(), 123_456_000);

        let mut changed = rec.clone();
        changed.set_content(b"x".to_vec(), created + chrono::Duration::nanoseconds(1_000_999));
        store.update(&changed).await.unwrap();

        let stored = store.get_by_name("f").await.unwrap();
        assert_eq!(stored.modified.timestamp_subsec_nanos(), 124_457_000);
        assert_eq!(stored.created, rec.created);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_record() {
        let store = MemoryRecordStore::new();
        let rec = store
            .create("f", "fstor", Vec::new(), Utc::now())
            .await
            .unwrap();
        store.delete(&rec).await.unwrap();
        assert!(store.is_empty().await);

        assert!(store.update(&rec).await.unwrap_err().is_not_found());
        assert!(store.delete(&rec).await.unwrap_err().is_not_found());
    }
}
