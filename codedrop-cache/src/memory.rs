use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use codedrop_core::DropId;

use crate::CacheError;
use crate::cache::{AdmissionCache, counter_key};

/// In-memory [`AdmissionCache`] for unit tests.
///
/// Counters are per-key atomics, so the exactly-N admission property holds
/// under concurrent callers just as it does for the Redis script. Counters
/// never expire; this backend is not meant to outlive a test.
#[derive(Debug, Default)]
pub struct MemoryAdmissionCache {
    counters: DashMap<String, AtomicI64>,
}

impl MemoryAdmissionCache {
    /// Create a new, empty in-memory admission cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter value for a drop, if any increment has happened.
    pub fn count(&self, drop_id: &DropId) -> Option<i64> {
        self.counters
            .get(&counter_key(drop_id))
            .map(|c| c.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl AdmissionCache for MemoryAdmissionCache {
    async fn increment_and_check(
        &self,
        drop_id: &DropId,
        max_downloads: i32,
    ) -> Result<bool, CacheError> {
        let counter = self
            .counters
            .entry(counter_key(drop_id))
            .or_insert_with(|| AtomicI64::new(0));
        let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(current <= i64::from(max_downloads))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn admits_up_to_the_budget() {
        let cache = MemoryAdmissionCache::new();
        let id = DropId::new("d1");

        assert!(cache.increment_and_check(&id, 2).await.unwrap());
        assert!(cache.increment_and_check(&id, 2).await.unwrap());
        assert!(!cache.increment_and_check(&id, 2).await.unwrap());
    }

    #[tokio::test]
    async fn denial_is_permanent() {
        let cache = MemoryAdmissionCache::new();
        let id = DropId::new("d1");

        assert!(cache.increment_and_check(&id, 1).await.unwrap());
        for _ in 0..5 {
            assert!(!cache.increment_and_check(&id, 1).await.unwrap());
        }
        assert_eq!(cache.count(&id), Some(6));
    }

    #[tokio::test]
    async fn drops_have_independent_budgets() {
        let cache = MemoryAdmissionCache::new();
        let a = DropId::new("a");
        let b = DropId::new("b");

        assert!(cache.increment_and_check(&a, 1).await.unwrap());
        assert!(!cache.increment_and_check(&a, 1).await.unwrap());
        assert!(cache.increment_and_check(&b, 1).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_callers_admit_exactly_the_budget() {
        let cache = Arc::new(MemoryAdmissionCache::new());
        let id = DropId::new("herd");
        let budget = 5;
        let callers = 50;

        let mut handles = Vec::new();
        for _ in 0..callers {
            let cache = Arc::clone(&cache);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                cache.increment_and_check(&id, budget).await.unwrap()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, budget);
    }
}
