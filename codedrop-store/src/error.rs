use thiserror::Error;

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}
