//! Content-addressed blob storage for ciphertext chunks.
//!
//! The [`ObjectStore`] trait is a minimal put/get/delete surface over flat
//! string keys; the server stores chunk ciphertext under `chunks/<sha256>`
//! and never needs listing. Two backends:
//!
//! - [`S3ObjectStore`]: any S3-compatible service. Path-style addressing
//!   and an endpoint override make it work against local MinIO as well as
//!   AWS.
//! - [`MemoryObjectStore`]: in-process map for unit tests.
//!
//! Because keys are content addresses, overwriting an existing key always
//! writes identical bytes; concurrent writers racing on the same key are
//! harmless.

mod error;
mod memory;
mod s3;
mod store;

pub use error::StoreError;
pub use memory::MemoryObjectStore;
pub use s3::{S3Config, S3ObjectStore};
pub use store::ObjectStore;
