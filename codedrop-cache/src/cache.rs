use async_trait::async_trait;

use codedrop_core::DropId;

use crate::CacheError;

/// Trait for atomically charging download slots against a drop's budget.
///
/// Implementations must be `Send + Sync`, and `increment_and_check` must be
/// atomic across all concurrent callers: with a budget of `k`, at most `k`
/// calls may ever return `true` for a given drop.
#[async_trait]
pub trait AdmissionCache: Send + Sync {
    /// Increment the drop's download counter and return whether the new
    /// count is still within `max_downloads`.
    ///
    /// The counter only ever grows; once a call returns `false`, every
    /// subsequent call for the same drop returns `false` as well.
    async fn increment_and_check(
        &self,
        drop_id: &DropId,
        max_downloads: i32,
    ) -> Result<bool, CacheError>;
}

/// Render the counter key for a drop.
pub(crate) fn counter_key(drop_id: &DropId) -> String {
    format!("drop:{drop_id}:downloads")
}
