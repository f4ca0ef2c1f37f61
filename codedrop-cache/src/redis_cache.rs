use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::Script;

use codedrop_core::DropId;

use crate::CacheError;
use crate::cache::{AdmissionCache, counter_key};
use crate::config::RedisConfig;
use crate::scripts;

/// Redis-backed implementation of [`AdmissionCache`].
///
/// The increment, the first-time TTL, and the limit comparison run inside
/// one Lua script, so concurrent receivers observe a strictly ordered
/// counter even across server processes. Redis is the authority for
/// admission; the database deliberately does not track downloads.
pub struct RedisAdmissionCache {
    pool: Pool,
}

impl RedisAdmissionCache {
    /// Create a new `RedisAdmissionCache` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| CacheError::Connection(e.to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    /// Verify the Redis server is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the PING fails.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AdmissionCache for RedisAdmissionCache {
    async fn increment_and_check(
        &self,
        drop_id: &DropId,
        max_downloads: i32,
    ) -> Result<bool, CacheError> {
        let mut conn = self.conn().await?;

        let script = Script::new(scripts::INCREMENT_AND_CHECK);
        let allowed: i64 = script
            .key(counter_key(drop_id))
            .arg(max_downloads)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(allowed == 1)
    }
}
