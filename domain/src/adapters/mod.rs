//! Adapters that live inside the domain crate for convenience.
//!
//! The in-memory repository backs unit tests, local demos and serves as the
//! reference behaviour the SQL adapter is checked against. Real storage
//! adapters live in separate crates.

pub mod memory_repo;
