//! services/api/src/lib.rs
//!
//! Library root for the `api` service. The binaries in `src/bin` wire these
//! modules together into the running HTTP server and the OpenAPI generator.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
