//! Cache lifecycle worker.
//!
//! One async method per trigger event:
//!
//! - [`CacheWorker::install`] opens the current store and populates it with
//!   the seed resources, then signals skip-waiting.
//! - [`CacheWorker::activate`] deletes every store not named by the current
//!   version stamp, then signals claim.
//! - [`CacheWorker::handle_fetch`] serves GET requests cache-first and fills
//!   the store from the network on a miss.
//!
//! The host awaits each returned future before considering the phase done.

mod activate;
mod host;
mod install;
mod intercept;

#[cfg(test)]
mod testing;

pub use activate::ActivateReport;
pub use host::{Host, LocalHost};
pub use install::{InstallReport, SeedFailure};
pub use intercept::{FetchOutcome, ResponseSource};

use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::cache::{CacheDb, CacheStore};
use crate::http::Fetch;
use crate::Error;

/// Deploy-time worker settings. Set once, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Version-stamped name of the current store.
    pub cache_name: String,
    /// Resources fetched into the store at install time, in order.
    pub seed_resources: Vec<Url>,
    /// Cached page substituted when a navigation cannot be served at all.
    pub offline_page: Option<Url>,
}

/// Where the worker is in its own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version will never take control.
    Redundant,
}

/// Versioned cache lifecycle manager.
pub struct CacheWorker<F, H> {
    db: CacheDb,
    fetcher: F,
    host: H,
    config: WorkerConfig,
    state: RwLock<WorkerState>,
}

impl<F: Fetch, H: Host> CacheWorker<F, H> {
    pub fn new(db: CacheDb, fetcher: F, host: H, config: WorkerConfig) -> Self {
        Self { db, fetcher, host, config, state: RwLock::new(WorkerState::Parsed) }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    /// Open (creating if absent) the store named by the current version stamp.
    pub async fn current_store(&self) -> Result<CacheStore, Error> {
        self.db.open_store(&self.config.cache_name).await
    }
}
