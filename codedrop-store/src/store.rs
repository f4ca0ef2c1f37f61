use async_trait::async_trait;

use crate::error::StoreError;

/// Trait for storing ciphertext blobs under flat string keys.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Put must tolerate overwriting an existing key; the caller only ever
/// writes content-addressed keys, so a repeated put carries identical
/// bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError>;

    /// Fetch the object at `key`. Returns [`StoreError::NotFound`] if absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Delete the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
