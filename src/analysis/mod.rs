//! The analytical core: scoring utilities, threshold sweeps, pattern
//! detection and redundancy filtering. Everything in here is pure and
//! synchronous; fetching lives in `stats` and `odds`.

pub mod dedup;
pub mod patterns;
pub mod scoring;
pub mod threshold;
