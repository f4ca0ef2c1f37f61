//! The CodeDrop server: HTTP surface, drop orchestration, and reclamation.
//!
//! Request handling is stateless apart from shared backend handles; the
//! interesting mutual exclusion lives in the backends themselves: the
//! cache's atomic admission script, the database's unique constraint on
//! chunk positions, and the object store's overwrite-safe content
//! addressing. The [`reclaimer`] runs on a timer independent of request
//! flow and is the only component that deletes anything.

pub mod api;
pub mod config;
pub mod error;
pub mod reclaimer;
pub mod service;
