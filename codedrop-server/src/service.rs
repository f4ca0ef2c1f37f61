//! Orchestration of drop creation, chunk transfer, and statistics.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use codedrop_cache::{AdmissionCache, CacheError};
use codedrop_core::schemas::CreateDropRequest;
use codedrop_core::{DropId, parse_expires_in};
use codedrop_metadata::{MetadataError, MetadataStore, NewDrop, StorageStats};
use codedrop_store::{ObjectStore, StoreError};

/// Hard cap on a single ciphertext chunk. Clients send 4 MiB plaintext
/// chunks, which encrypt to 4 MiB + 28 bytes of nonce and tag.
pub const MAX_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Render the object-store key for a chunk hash.
pub fn blob_key(chunk_hash: &str) -> String {
    format!("chunks/{chunk_hash}")
}

/// Errors from drop service operations, classified for HTTP mapping.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request failed validation.
    #[error("{0}")]
    InvalidRequest(String),

    /// The chunk body exceeds [`MAX_CHUNK_SIZE`].
    #[error("chunk too large: {size} bytes (limit {limit})")]
    ChunkTooLarge { size: usize, limit: usize },

    /// No drop with the given id.
    #[error("drop not found")]
    DropNotFound,

    /// No chunk at the given position.
    #[error("chunk not found")]
    ChunkNotFound,

    /// The drop's expiry has passed.
    #[error("drop has expired")]
    Expired,

    /// The drop's download budget is exhausted.
    #[error("download limit reached")]
    LimitReached,

    /// Stored bytes no longer match their recorded hash.
    #[error("data integrity verification failed for chunk {chunk_index}")]
    Integrity { chunk_index: i32 },

    /// The metadata store failed.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// The object store failed.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// The admission cache failed.
    #[error("admission error: {0}")]
    Admission(#[from] CacheError),
}

/// Metadata returned to a receiver that has been admitted.
#[derive(Debug, Clone)]
pub struct DropMetadata {
    pub file_name: String,
    pub file_size: i64,
    pub encryption_salt: String,
    pub chunk_count: i64,
}

/// Orchestrates drop lifecycle over the storage backends.
///
/// The service performs at most one mutating write per operation, so no
/// request-path transactions are needed; crash-consistency comes from
/// write ordering (blob before chunk row) rather than rollback.
pub struct DropService {
    metadata: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    admission: Arc<dyn AdmissionCache>,
}

impl DropService {
    /// Create a new service over the given backends.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        admission: Arc<dyn AdmissionCache>,
    ) -> Self {
        Self {
            metadata,
            objects,
            admission,
        }
    }

    /// Validate and persist a new drop. Returns its id and absolute expiry.
    pub async fn create_drop(
        &self,
        req: CreateDropRequest,
    ) -> Result<(DropId, DateTime<Utc>), ServiceError> {
        let lifetime =
            parse_expires_in(&req.expires_in).map_err(|e| ServiceError::InvalidRequest(e.to_string()))?;
        if req.max_downloads < 1 {
            return Err(ServiceError::InvalidRequest(
                "max_downloads must be at least 1".to_owned(),
            ));
        }
        if req.file_size < 0 {
            return Err(ServiceError::InvalidRequest(
                "file_size must not be negative".to_owned(),
            ));
        }

        let lifetime = chrono::Duration::from_std(lifetime)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?;
        let expires_at = Utc::now() + lifetime;

        let drop_id = self
            .metadata
            .insert_drop(NewDrop {
                file_name: req.file_name,
                file_size: req.file_size,
                encryption_salt: req.encryption_salt,
                expires_at,
                max_downloads: req.max_downloads,
            })
            .await?;

        info!(drop_id = %drop_id, expires_at = %expires_at, "drop created");
        Ok((drop_id, expires_at))
    }

    /// Store one ciphertext chunk and record its metadata.
    ///
    /// The blob is written before the chunk row: a crash between the two
    /// leaves an unreferenced blob (a tolerable leak) rather than a row
    /// pointing at nothing. Re-uploads are idempotent: the blob write is
    /// content-addressed and the row insert is first-write-wins.
    ///
    /// Returns the hex SHA-256 under which the ciphertext was stored.
    pub async fn upload_chunk(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
        body: &[u8],
    ) -> Result<String, ServiceError> {
        if chunk_index < 0 {
            return Err(ServiceError::InvalidRequest(
                "chunk index must not be negative".to_owned(),
            ));
        }
        if body.len() > MAX_CHUNK_SIZE {
            return Err(ServiceError::ChunkTooLarge {
                size: body.len(),
                limit: MAX_CHUNK_SIZE,
            });
        }

        let chunk_hash = hex::encode(Sha256::digest(body));

        self.objects
            .put(&blob_key(&chunk_hash), body)
            .await
            .map_err(ServiceError::Storage)?;

        self.metadata
            .insert_chunk(drop_id, chunk_index, &chunk_hash, body.len() as i64)
            .await?;

        debug!(
            drop_id = %drop_id,
            chunk_index,
            chunk_hash = %chunk_hash,
            size = body.len(),
            "chunk stored"
        );
        Ok(chunk_hash)
    }

    /// Fetch a drop's metadata, charging one admission slot.
    ///
    /// Admission is charged per metadata fetch, not per chunk: a receiver
    /// fetches metadata exactly once and then streams chunks freely.
    pub async fn get_metadata(&self, drop_id: &DropId) -> Result<DropMetadata, ServiceError> {
        let drop = self
            .metadata
            .get_drop(drop_id)
            .await?
            .ok_or(ServiceError::DropNotFound)?;

        if drop.is_expired_at(Utc::now()) {
            return Err(ServiceError::Expired);
        }

        let allowed = self
            .admission
            .increment_and_check(drop_id, drop.max_downloads)
            .await?;
        if !allowed {
            debug!(drop_id = %drop_id, "admission denied");
            return Err(ServiceError::LimitReached);
        }

        let chunk_count = self.metadata.chunk_count(drop_id).await?;
        Ok(DropMetadata {
            file_name: drop.file_name,
            file_size: drop.file_size,
            encryption_salt: drop.encryption_salt,
            chunk_count,
        })
    }

    /// Fetch one ciphertext chunk, verifying it against its recorded hash.
    ///
    /// A mismatch means the stored bytes rotted or were tampered with; the
    /// chunk is never served in that case.
    pub async fn download_chunk(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
    ) -> Result<Vec<u8>, ServiceError> {
        let chunk_hash = self
            .metadata
            .chunk_hash(drop_id, chunk_index)
            .await?
            .ok_or(ServiceError::ChunkNotFound)?;

        let body = self
            .objects
            .get(&blob_key(&chunk_hash))
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => ServiceError::ChunkNotFound,
                other => ServiceError::Storage(other),
            })?;

        let actual = hex::encode(Sha256::digest(&body));
        if actual != chunk_hash {
            return Err(ServiceError::Integrity { chunk_index });
        }

        Ok(body)
    }

    /// Compute aggregate storage statistics.
    pub async fn stats(&self) -> Result<StorageStats, ServiceError> {
        Ok(self.metadata.stats(Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use codedrop_cache::MemoryAdmissionCache;
    use codedrop_metadata::MemoryMetadataStore;
    use codedrop_store::MemoryObjectStore;

    struct Harness {
        service: DropService,
        metadata: Arc<MemoryMetadataStore>,
        objects: Arc<MemoryObjectStore>,
    }

    fn harness() -> Harness {
        let metadata = Arc::new(MemoryMetadataStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let admission = Arc::new(MemoryAdmissionCache::new());
        let service = DropService::new(
            Arc::clone(&metadata) as Arc<dyn MetadataStore>,
            Arc::clone(&objects) as Arc<dyn ObjectStore>,
            admission as Arc<dyn AdmissionCache>,
        );
        Harness {
            service,
            metadata,
            objects,
        }
    }

    fn create_request(expires_in: &str, max_downloads: i32) -> CreateDropRequest {
        CreateDropRequest {
            file_name: "payload.bin".into(),
            file_size: 44,
            encryption_salt: "v1-aes-gcm".into(),
            expires_in: expires_in.into(),
            max_downloads,
        }
    }

    #[tokio::test]
    async fn create_upload_download_roundtrip() {
        let h = harness();
        let (id, expires_at) = h
            .service
            .create_drop(create_request("1h", 3))
            .await
            .unwrap();
        assert!(expires_at > Utc::now());

        let body = b"ciphertext chunk zero";
        let hash = h.service.upload_chunk(&id, 0, body).await.unwrap();
        assert_eq!(hash, hex::encode(Sha256::digest(body)));

        let meta = h.service.get_metadata(&id).await.unwrap();
        assert_eq!(meta.file_name, "payload.bin");
        assert_eq!(meta.chunk_count, 1);

        let downloaded = h.service.download_chunk(&id, 0).await.unwrap();
        assert_eq!(downloaded, body);
    }

    #[tokio::test]
    async fn create_rejects_duration_over_24h() {
        let h = harness();
        let err = h
            .service
            .create_drop(create_request("25h", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_malformed_duration() {
        let h = harness();
        let err = h
            .service
            .create_drop(create_request("whenever", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_nonpositive_max_downloads() {
        let h = harness();
        let err = h
            .service
            .create_drop(create_request("1h", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn upload_is_idempotent() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();

        let body = b"same chunk";
        h.service.upload_chunk(&id, 0, body).await.unwrap();
        h.service.upload_chunk(&id, 0, body).await.unwrap();

        assert_eq!(h.metadata.chunk_count(&id).await.unwrap(), 1);
        assert_eq!(h.objects.len(), 1);
    }

    #[tokio::test]
    async fn conflicting_reupload_keeps_first_row() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();

        let first = b"original bytes";
        let second = b"different bytes";
        h.service.upload_chunk(&id, 0, first).await.unwrap();
        h.service.upload_chunk(&id, 0, second).await.unwrap();

        assert_eq!(h.metadata.chunk_count(&id).await.unwrap(), 1);
        let downloaded = h.service.download_chunk(&id, 0).await.unwrap();
        assert_eq!(downloaded, first);
    }

    #[tokio::test]
    async fn upload_rejects_oversized_chunk() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();

        let body = vec![0u8; MAX_CHUNK_SIZE + 1];
        let err = h.service.upload_chunk(&id, 0, &body).await.unwrap_err();
        assert!(matches!(err, ServiceError::ChunkTooLarge { .. }));
    }

    #[tokio::test]
    async fn upload_rejects_negative_index() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();
        let err = h.service.upload_chunk(&id, -1, b"x").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn identical_chunks_deduplicate_across_drops() {
        let h = harness();
        let (a, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();
        let (b, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();

        let body = vec![0xAB; 4096];
        h.service.upload_chunk(&a, 0, &body).await.unwrap();
        h.service.upload_chunk(&b, 0, &body).await.unwrap();

        assert_eq!(h.objects.len(), 1);
        let stats = h.service.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.storage_used, 4096);
        assert_eq!(stats.storage_saved, 4096);
    }

    #[tokio::test]
    async fn metadata_for_unknown_drop_is_not_found() {
        let h = harness();
        let err = h
            .service
            .get_metadata(&DropId::new("no-such-drop"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DropNotFound));
    }

    #[tokio::test]
    async fn metadata_for_expired_drop_is_gone() {
        let h = harness();
        let id = h
            .metadata
            .insert_drop(NewDrop {
                file_name: "old.bin".into(),
                file_size: 1,
                encryption_salt: "v1-aes-gcm".into(),
                expires_at: Utc::now() - Duration::seconds(5),
                max_downloads: 1,
            })
            .await
            .unwrap();

        let err = h.service.get_metadata(&id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Expired));
    }

    #[tokio::test]
    async fn admission_allows_exactly_the_budget_under_contention() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 3)).await.unwrap();

        let service = Arc::new(h.service);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = Arc::clone(&service);
            let id = id.clone();
            handles.push(tokio::spawn(
                async move { service.get_metadata(&id).await },
            ));
        }

        let mut admitted = 0;
        let mut denied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(ServiceError::LimitReached) => denied += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(denied, 17);
    }

    #[tokio::test]
    async fn download_of_unknown_chunk_is_not_found() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();
        let err = h.service.download_chunk(&id, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::ChunkNotFound));
    }

    #[tokio::test]
    async fn corrupted_blob_is_never_served() {
        let h = harness();
        let (id, _) = h.service.create_drop(create_request("1h", 1)).await.unwrap();

        let body = b"pristine ciphertext";
        let hash = h.service.upload_chunk(&id, 0, body).await.unwrap();

        h.objects
            .put(&blob_key(&hash), b"bitrot happened here")
            .await
            .unwrap();

        let err = h.service.download_chunk(&id, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Integrity { chunk_index: 0 }));
    }
}
