//! Shared wire types for the murmur chat backend.
//!
//! Request and response bodies live here so the API crate and any client
//! code agree on one definition. Identifiers are plain integers assigned
//! by the database.

pub mod api;
pub mod models;
