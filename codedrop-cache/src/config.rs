use std::time::Duration;

/// Configuration for the Redis admission cache.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g. `redis://localhost:6379`).
    pub url: String,

    /// Maximum number of pooled connections.
    pub pool_size: usize,

    /// How long to wait for a pooled connection before failing.
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            pool_size: 16,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = RedisConfig::default();
        assert_eq!(cfg.url, "redis://127.0.0.1:6379");
        assert_eq!(cfg.pool_size, 16);
        assert_eq!(cfg.connection_timeout, Duration::from_secs(5));
    }
}
