//! Relational persistence for drops and chunks.
//!
//! The [`MetadataStore`] trait covers everything the drop service and the
//! reclaimer need from the database: deduplicating chunk inserts, cascade
//! deletes, per-hash reference counts, expiry scans, and the storage
//! statistics that prove deduplication is working.
//!
//! Two backends:
//!
//! - [`PostgresMetadataStore`]: `sqlx` pool, schema created at startup.
//! - [`MemoryMetadataStore`]: in-process maps for unit tests.
//!
//! Chunk-row uniqueness on `(drop_id, chunk_index)` is a database-enforced
//! invariant (`ON CONFLICT DO NOTHING`), never re-checked in application
//! code; the first write wins and duplicate uploads do not inflate counts.

mod config;
mod error;
mod memory;
pub mod migrations;
mod postgres;
mod store;

pub use config::PostgresConfig;
pub use error::MetadataError;
pub use memory::MemoryMetadataStore;
pub use postgres::PostgresMetadataStore;
pub use store::{ChunkRecord, DropRecord, MetadataStore, NewDrop, StorageStats};
