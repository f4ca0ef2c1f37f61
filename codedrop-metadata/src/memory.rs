use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use codedrop_core::DropId;

use crate::error::MetadataError;
use crate::store::{ChunkRecord, DropRecord, MetadataStore, NewDrop, StorageStats};

/// In-memory [`MetadataStore`] backed by [`DashMap`]s, for unit tests.
///
/// Chunk idempotence is enforced the same way the database does it: the
/// first row inserted at `(drop_id, chunk_index)` wins and later inserts
/// are ignored.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    drops: DashMap<String, DropRecord>,
    chunks: DashMap<String, BTreeMap<i32, ChunkRecord>>,
}

impl MemoryMetadataStore {
    /// Create a new, empty in-memory metadata store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert_drop(&self, drop: NewDrop) -> Result<DropId, MetadataError> {
        let id = DropId::new(Uuid::new_v4().to_string());
        self.drops.insert(
            id.as_str().to_owned(),
            DropRecord {
                id: id.clone(),
                file_name: drop.file_name,
                file_size: drop.file_size,
                encryption_salt: drop.encryption_salt,
                expires_at: drop.expires_at,
                max_downloads: drop.max_downloads,
            },
        );
        Ok(id)
    }

    async fn insert_chunk(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
        chunk_hash: &str,
        size: i64,
    ) -> Result<(), MetadataError> {
        if !self.drops.contains_key(drop_id.as_str()) {
            return Err(MetadataError::Backend(format!(
                "no such drop: {drop_id}"
            )));
        }

        let mut rows = self.chunks.entry(drop_id.as_str().to_owned()).or_default();
        rows.entry(chunk_index).or_insert_with(|| ChunkRecord {
            chunk_index,
            chunk_hash: chunk_hash.to_owned(),
            size,
        });
        Ok(())
    }

    async fn get_drop(&self, drop_id: &DropId) -> Result<Option<DropRecord>, MetadataError> {
        Ok(self.drops.get(drop_id.as_str()).map(|r| r.value().clone()))
    }

    async fn chunk_count(&self, drop_id: &DropId) -> Result<i64, MetadataError> {
        Ok(self
            .chunks
            .get(drop_id.as_str())
            .map_or(0, |rows| rows.len() as i64))
    }

    async fn chunk_hash(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
    ) -> Result<Option<String>, MetadataError> {
        Ok(self
            .chunks
            .get(drop_id.as_str())
            .and_then(|rows| rows.get(&chunk_index).map(|c| c.chunk_hash.clone())))
    }

    async fn list_chunk_hashes(&self, drop_id: &DropId) -> Result<Vec<String>, MetadataError> {
        Ok(self.chunks.get(drop_id.as_str()).map_or_else(Vec::new, |rows| {
            rows.values().map(|c| c.chunk_hash.clone()).collect()
        }))
    }

    async fn delete_drop(&self, drop_id: &DropId) -> Result<(), MetadataError> {
        self.drops.remove(drop_id.as_str());
        self.chunks.remove(drop_id.as_str());
        Ok(())
    }

    async fn ref_count(&self, chunk_hash: &str) -> Result<i64, MetadataError> {
        let count = self
            .chunks
            .iter()
            .map(|rows| {
                rows.values()
                    .filter(|c| c.chunk_hash == chunk_hash)
                    .count() as i64
            })
            .sum();
        Ok(count)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<DropId>, MetadataError> {
        Ok(self
            .drops
            .iter()
            .filter(|entry| entry.value().expires_at < now)
            .map(|entry| entry.value().id.clone())
            .collect())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<StorageStats, MetadataError> {
        let active_drops = self
            .drops
            .iter()
            .filter(|entry| entry.value().expires_at > now)
            .count() as i64;

        let mut distinct: HashMap<String, i64> = HashMap::new();
        let mut logical_size = 0i64;
        for rows in self.chunks.iter() {
            for chunk in rows.values() {
                logical_size += chunk.size;
                distinct.insert(chunk.chunk_hash.clone(), chunk.size);
            }
        }

        let storage_used: i64 = distinct.values().sum();
        Ok(StorageStats {
            active_drops,
            total_chunks: distinct.len() as i64,
            storage_used,
            storage_saved: logical_size - storage_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn test_drop(expires_in_secs: i64) -> NewDrop {
        NewDrop {
            file_name: "notes.txt".into(),
            file_size: 128,
            encryption_salt: "v1-aes-gcm".into(),
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
            max_downloads: 2,
        }
    }

    #[tokio::test]
    async fn insert_and_get_drop() {
        let store = MemoryMetadataStore::new();
        let id = store.insert_drop(test_drop(600)).await.unwrap();

        let record = store.get_drop(&id).await.unwrap().unwrap();
        assert_eq!(record.file_name, "notes.txt");
        assert_eq!(record.max_downloads, 2);
    }

    #[tokio::test]
    async fn get_unknown_drop_returns_none() {
        let store = MemoryMetadataStore::new();
        let missing = DropId::new("does-not-exist");
        assert!(store.get_drop(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn chunk_insert_is_first_write_wins() {
        let store = MemoryMetadataStore::new();
        let id = store.insert_drop(test_drop(600)).await.unwrap();

        store.insert_chunk(&id, 0, "hash-a", 10).await.unwrap();
        store.insert_chunk(&id, 0, "hash-b", 99).await.unwrap();

        assert_eq!(store.chunk_count(&id).await.unwrap(), 1);
        assert_eq!(
            store.chunk_hash(&id, 0).await.unwrap().as_deref(),
            Some("hash-a")
        );
    }

    #[tokio::test]
    async fn chunk_hashes_listed_in_index_order() {
        let store = MemoryMetadataStore::new();
        let id = store.insert_drop(test_drop(600)).await.unwrap();

        store.insert_chunk(&id, 2, "c", 1).await.unwrap();
        store.insert_chunk(&id, 0, "a", 1).await.unwrap();
        store.insert_chunk(&id, 1, "b", 1).await.unwrap();

        assert_eq!(store.list_chunk_hashes(&id).await.unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn delete_drop_cascades_chunks() {
        let store = MemoryMetadataStore::new();
        let id = store.insert_drop(test_drop(600)).await.unwrap();
        store.insert_chunk(&id, 0, "shared", 10).await.unwrap();

        store.delete_drop(&id).await.unwrap();
        assert!(store.get_drop(&id).await.unwrap().is_none());
        assert_eq!(store.chunk_count(&id).await.unwrap(), 0);
        assert_eq!(store.ref_count("shared").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ref_count_spans_drops() {
        let store = MemoryMetadataStore::new();
        let a = store.insert_drop(test_drop(600)).await.unwrap();
        let b = store.insert_drop(test_drop(600)).await.unwrap();

        store.insert_chunk(&a, 0, "shared", 10).await.unwrap();
        store.insert_chunk(&b, 0, "shared", 10).await.unwrap();
        assert_eq!(store.ref_count("shared").await.unwrap(), 2);

        store.delete_drop(&a).await.unwrap();
        assert_eq!(store.ref_count("shared").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_expired_selects_only_past_expiry() {
        let store = MemoryMetadataStore::new();
        let expired = store.insert_drop(test_drop(-10)).await.unwrap();
        let live = store.insert_drop(test_drop(600)).await.unwrap();

        let found = store.find_expired(Utc::now()).await.unwrap();
        assert!(found.contains(&expired));
        assert!(!found.contains(&live));
    }

    #[tokio::test]
    async fn stats_reflect_deduplication() {
        let store = MemoryMetadataStore::new();
        let a = store.insert_drop(test_drop(600)).await.unwrap();
        let b = store.insert_drop(test_drop(600)).await.unwrap();

        store.insert_chunk(&a, 0, "dup", 100).await.unwrap();
        store.insert_chunk(&b, 0, "dup", 100).await.unwrap();
        store.insert_chunk(&b, 1, "unique", 50).await.unwrap();

        let stats = store.stats(Utc::now()).await.unwrap();
        assert_eq!(stats.active_drops, 2);
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.storage_used, 150);
        assert_eq!(stats.storage_saved, 100);
    }
}
