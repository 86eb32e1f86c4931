//! Form-based betting insights for football fixtures.
//!
//! Detects per-market scoring patterns from season match logs, grades them
//! against the opposition a team is about to face, and serves the resolved
//! insight list through a CLI and an HTTP API.

pub mod analysis;
pub mod config;
pub mod context;
pub mod db;
pub mod engine;
pub mod logging;
pub mod markets;
pub mod odds;
pub mod resolver;
pub mod server;
pub mod stats;
