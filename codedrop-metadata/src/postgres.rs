use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use codedrop_core::DropId;

use crate::config::PostgresConfig;
use crate::error::MetadataError;
use crate::migrations;
use crate::store::{DropRecord, MetadataStore, NewDrop, StorageStats};

/// `PostgreSQL`-backed implementation of [`MetadataStore`].
///
/// Drop ids are UUIDs minted by the database (`gen_random_uuid()`). Ids
/// that do not parse as UUIDs cannot name an existing row, so lookups with
/// such ids short-circuit to "not found" without touching the database.
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    /// Connect to `PostgreSQL`, create the pool, and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Connection`] if pool creation fails, or
    /// [`MetadataError::Backend`] if migrations fail.
    pub async fn new(config: &PostgresConfig) -> Result<Self, MetadataError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await
            .map_err(|e| MetadataError::Connection(e.to_string()))?;

        migrations::run_migrations(&pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        info!("connected to postgres and applied migrations");
        Ok(Self { pool })
    }

    /// Create a store from an existing pool. Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool) -> Result<Self, MetadataError> {
        migrations::run_migrations(&pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }

    fn parse_id(drop_id: &DropId) -> Option<Uuid> {
        Uuid::parse_str(drop_id.as_str()).ok()
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn insert_drop(&self, drop: NewDrop) -> Result<DropId, MetadataError> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO drops (file_name, file_size, encryption_salt, expires_at, max_downloads) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(&drop.file_name)
        .bind(drop.file_size)
        .bind(&drop.encryption_salt)
        .bind(drop.expires_at)
        .bind(drop.max_downloads)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(DropId::new(id.to_string()))
    }

    async fn insert_chunk(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
        chunk_hash: &str,
        size: i64,
    ) -> Result<(), MetadataError> {
        let id = Self::parse_id(drop_id)
            .ok_or_else(|| MetadataError::Backend(format!("not a valid drop id: {drop_id}")))?;

        sqlx::query(
            "INSERT INTO chunks (drop_id, chunk_index, chunk_hash, size) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (drop_id, chunk_index) DO NOTHING",
        )
        .bind(id)
        .bind(chunk_index)
        .bind(chunk_hash)
        .bind(size)
        .execute(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn get_drop(&self, drop_id: &DropId) -> Result<Option<DropRecord>, MetadataError> {
        let Some(id) = Self::parse_id(drop_id) else {
            return Ok(None);
        };

        let row: Option<(Uuid, String, i64, String, DateTime<Utc>, i32)> = sqlx::query_as(
            "SELECT id, file_name, file_size, encryption_salt, expires_at, max_downloads \
             FROM drops WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(row.map(
            |(id, file_name, file_size, encryption_salt, expires_at, max_downloads)| DropRecord {
                id: DropId::new(id.to_string()),
                file_name,
                file_size,
                encryption_salt,
                expires_at,
                max_downloads,
            },
        ))
    }

    async fn chunk_count(&self, drop_id: &DropId) -> Result<i64, MetadataError> {
        let Some(id) = Self::parse_id(drop_id) else {
            return Ok(0);
        };

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chunks WHERE drop_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(count)
    }

    async fn chunk_hash(
        &self,
        drop_id: &DropId,
        chunk_index: i32,
    ) -> Result<Option<String>, MetadataError> {
        let Some(id) = Self::parse_id(drop_id) else {
            return Ok(None);
        };

        let row: Option<(String,)> = sqlx::query_as(
            "SELECT chunk_hash FROM chunks WHERE drop_id = $1 AND chunk_index = $2",
        )
        .bind(id)
        .bind(chunk_index)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(row.map(|(hash,)| hash))
    }

    async fn list_chunk_hashes(&self, drop_id: &DropId) -> Result<Vec<String>, MetadataError> {
        let Some(id) = Self::parse_id(drop_id) else {
            return Ok(Vec::new());
        };

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT chunk_hash FROM chunks WHERE drop_id = $1 ORDER BY chunk_index",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(|(hash,)| hash).collect())
    }

    async fn delete_drop(&self, drop_id: &DropId) -> Result<(), MetadataError> {
        let Some(id) = Self::parse_id(drop_id) else {
            return Ok(());
        };

        sqlx::query("DELETE FROM drops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn ref_count(&self, chunk_hash: &str) -> Result<i64, MetadataError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chunks WHERE chunk_hash = $1")
                .bind(chunk_hash)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(count)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<DropId>, MetadataError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM drops WHERE expires_at < $1")
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id,)| DropId::new(id.to_string()))
            .collect())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<StorageStats, MetadataError> {
        let (active_drops,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM drops WHERE expires_at > $1")
                .bind(now)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MetadataError::Backend(e.to_string()))?;

        let (total_chunks,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT chunk_hash) FROM chunks")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MetadataError::Backend(e.to_string()))?;

        // Physical usage sums each distinct blob once; COALESCE turns an
        // empty table into 0 rather than NULL.
        let (storage_used,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(size), 0)::BIGINT \
             FROM (SELECT DISTINCT chunk_hash, size FROM chunks) AS unique_chunks",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MetadataError::Backend(e.to_string()))?;

        let (logical_size,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(size), 0)::BIGINT FROM chunks")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(StorageStats {
            active_drops,
            total_chunks,
            storage_used,
            storage_saved: logical_size - storage_used,
        })
    }
}
