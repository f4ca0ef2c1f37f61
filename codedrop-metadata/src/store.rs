use async_trait::async_trait;
use chrono::{DateTime, Utc};

use codedrop_core::DropId;

use crate::error::MetadataError;

/// Parameters for inserting a new drop.
#[derive(Debug, Clone)]
pub struct NewDrop {
    pub file_name: String,
    pub file_size: i64,
    pub encryption_salt: String,
    pub expires_at: DateTime<Utc>,
    pub max_downloads: i32,
}

/// A persisted drop row.
#[derive(Debug, Clone)]
pub struct DropRecord {
    pub id: DropId,
    pub file_name: String,
    pub file_size: i64,
    pub encryption_salt: String,
    pub expires_at: DateTime<Utc>,
    pub max_downloads: i32,
}

impl DropRecord {
    /// Returns `true` if this drop's expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A persisted chunk row.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub chunk_index: i32,
    pub chunk_hash: String,
    pub size: i64,
}

/// Aggregate storage statistics derived from chunk rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Drops whose expiry is still in the future.
    pub active_drops: i64,
    /// Count of distinct chunk hashes (physical blobs).
    pub total_chunks: i64,
    /// Bytes physically stored: sum of sizes over distinct hashes.
    pub storage_used: i64,
    /// Bytes deduplication avoided: sum over all rows minus `storage_used`.
    pub storage_saved: i64,
}

/// Trait for persisting drop and chunk metadata.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new drop and return its server-assigned id.
    async fn insert_drop(&self, drop: NewDrop) -> Result<DropId, MetadataError>;

    /// Insert a chunk row, idempotent on `(drop_id, chunk_index)`.
    ///
    /// A second insert for the same position is silently ignored regardless
    /// of its hash: the first write wins.
    async fn insert_chunk(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
        chunk_hash: &str,
        size: i64,
    ) -> Result<(), MetadataError>;

    /// Fetch a drop row. Returns `None` when the id is unknown.
    async fn get_drop(&self, drop_id: &DropId) -> Result<Option<DropRecord>, MetadataError>;

    /// Number of chunk rows belonging to a drop.
    async fn chunk_count(&self, drop_id: &DropId) -> Result<i64, MetadataError>;

    /// Hash of the chunk at `chunk_index`, or `None` if no such row.
    async fn chunk_hash(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
    ) -> Result<Option<String>, MetadataError>;

    /// All chunk hashes of a drop, ordered by chunk index.
    async fn list_chunk_hashes(&self, drop_id: &DropId) -> Result<Vec<String>, MetadataError>;

    /// Delete a drop; its chunk rows cascade away with it.
    async fn delete_drop(&self, drop_id: &DropId) -> Result<(), MetadataError>;

    /// Number of chunk rows (across all drops) referencing `chunk_hash`.
    async fn ref_count(&self, chunk_hash: &str) -> Result<i64, MetadataError>;

    /// Ids of all drops whose expiry has passed at `now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<DropId>, MetadataError>;

    /// Compute aggregate storage statistics.
    async fn stats(&self, now: DateTime<Utc>) -> Result<StorageStats, MetadataError>;
}
