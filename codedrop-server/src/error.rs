use thiserror::Error;

use codedrop_cache::CacheError;
use codedrop_metadata::MetadataError;

/// Errors that can occur when starting or running the CodeDrop server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata store could not be reached or migrated.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// The admission cache could not be reached.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}
