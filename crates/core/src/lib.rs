//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model with single-consume bodies
//! - Versioned cache storage with SQLite backend
//! - The cache lifecycle worker (install, activate, fetch interception)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod worker;

pub use cache::{CacheDb, CacheStore, StoreSummary};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Body, CacheMode, Fetch, Request, RequestMode, Response, ResponseType};
pub use worker::{CacheWorker, FetchOutcome, Host, LocalHost, ResponseSource, WorkerConfig, WorkerState};
