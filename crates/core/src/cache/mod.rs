//! SQLite-backed cache storage: a set of named stores of request/response entries.
//!
//! This module provides a persistent, versioned cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named stores, one per deployed version stamp
//! - Exact-match entries keyed by a SHA-256 of method and URL
//! - Automatic schema migrations
//! - Cascading deletion of a store's entries

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod storage;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::StoreSummary;
pub use store::CacheStore;
