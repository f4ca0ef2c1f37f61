use thiserror::Error;

/// Errors from metadata store operations.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),
}
