//! SQLite persistence for stats snapshots and run history.

pub mod store;

pub use store::Store;
