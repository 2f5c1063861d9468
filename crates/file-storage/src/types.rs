//! Core types for database-backed file storage

use chrono::{DateTime, Utc};
use file_storage_db::DbFileRow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Durable representation of one named blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRecord {
    /// Logical identity, unique across the store
    pub name: String,
    /// Stable external identifier assigned at creation
    pub uuid: String,
    pub data: Vec<u8>,
    /// Always `data.len()`
    pub size: u64,
    /// Tag of the writer that created the record
    pub owner: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl BlobRecord {
    /// Replace the content, keeping `size` in step with `data`
    pub fn set_content(&mut self, data: Vec<u8>, modified: DateTime<Utc>) {
        self.size = data.len() as u64;
        self.data = data;
        self.modified = modified;
    }
}

impl From<DbFileRow> for BlobRecord {
    fn from(row: DbFileRow) -> Self {
        Self {
            size: row.data.len() as u64,
            name: row.name,
            uuid: row.uuid,
            data: row.data,
            owner: row.owner,
            created: row.created,
            modified: row.modified,
        }
    }
}

/// Denormalized, time-limited copy of a [`BlobRecord`] held in the cache
///
/// Never authoritative. The owner tag is not part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub name: String,
    pub uuid: String,
    pub size: u64,
    pub data: Arc<[u8]>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl From<&BlobRecord> for CacheSnapshot {
    fn from(record: &BlobRecord) -> Self {
        Self {
            name: record.name.clone(),
            uuid: record.uuid.clone(),
            size: record.size,
            data: Arc::from(record.data.as_slice()),
            created: record.created,
            modified: record.modified,
        }
    }
}

/// Statistics about the cache overlay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BlobRecord {
        let now = Utc::now();
        BlobRecord {
            name: "tunnel/script.py".to_string(),
            uuid: "0b5e5a4e-3c1f-4d47-9d0f-7f6b2b0a1c11".to_string(),
            data: b"print('hi')".to_vec(),
            size: 11,
            owner: "fstor".to_string(),
            created: now,
            modified: now,
        }
    }

    #[test]
    fn test_set_content_recomputes_size() {
        let mut rec = record();
        let created = rec.created;
        let later = created + chrono::Duration::seconds(5);

        rec.set_content(Vec::new(), later);
        assert_eq!(rec.size, 0);
        assert!(rec.data.is_empty());
        assert_eq!(rec.modified, later);
        assert_eq!(rec.created, created);
    }

    #[test]
    fn test_snapshot_copies_fields() {
        let rec = record();
        let snap = CacheSnapshot::from(&rec);
        assert_eq!(snap.name, rec.name);
        assert_eq!(snap.uuid, rec.uuid);
        assert_eq!(snap.size, rec.size);
        assert_eq!(&*snap.data, rec.data.as_slice());
        assert_eq!(snap.created, rec.created);
        assert_eq!(snap.modified, rec.modified);
    }

    #[test]
    fn test_record_from_row_uses_data_length() {
        let now = Utc::now();
        let row = DbFileRow {
            uuid: "u-1".to_string(),
            name: "a/b".to_string(),
            owner: "fstor".to_string(),
            data: vec![1, 2, 3],
            size: 3,
            created: now,
            modified: now,
        };
        let rec = BlobRecord::from(row);
        assert_eq!(rec.size, 3);
        assert_eq!(rec.name, "a/b");
    }

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert!(!stats.enabled);
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            enabled: true,
            entries: 4,
            hits: 10,
            misses: 2,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"enabled\":true"));
        let back: CacheStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hits, 10);
    }
}
