//! Network client for swcache.
//!
//! This crate provides the HTTP side of the cache worker: a `reqwest`-backed
//! implementation of [`swcache_core::Fetch`] that classifies responses as
//! basic, cors or opaque relative to the application origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, classify, resolve};
