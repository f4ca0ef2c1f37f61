//! Atomic download-count admission for drops.
//!
//! Every metadata fetch charges one slot against a drop's `max_downloads`
//! budget. Under a thundering herd of receivers racing for the last slot,
//! exactly the budgeted number may win. A naive read-then-increment loses
//! that guarantee, so the increment, the first-time TTL, and the limit
//! comparison execute as a single server-side Lua script
//! ([`RedisAdmissionCache`]).
//!
//! Counters are keyed `drop:<id>:downloads` and expire 24 hours after
//! their first increment, which bounds cache memory to roughly the set of
//! drops receivers touched in the last day.
//!
//! [`MemoryAdmissionCache`] provides the same atomicity in-process for
//! unit tests.

mod cache;
mod config;
mod memory;
mod redis_cache;
mod scripts;

pub use cache::AdmissionCache;
pub use config::RedisConfig;
pub use memory::MemoryAdmissionCache;
pub use redis_cache::RedisAdmissionCache;

use thiserror::Error;

/// Errors from admission cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),
}
