//! Core types shared between the CodeDrop server, client, and CLI.
//!
//! This crate holds the pieces both sides of the wire must agree on:
//!
//! - [`DropId`], the opaque, server-assigned drop identifier.
//! - The v1 API request/response schemas ([`schemas`]).
//! - Parsing and validation of `expires_in` duration strings ([`duration`]).
//!
//! Schema types optionally derive `utoipa::ToSchema` behind the `openapi`
//! feature so the server can publish OpenAPI docs without forcing the
//! dependency on the client or CLI.

pub mod duration;
pub mod schemas;
mod types;

pub use duration::{MAX_EXPIRES_IN, parse_expires_in};
pub use types::DropId;
