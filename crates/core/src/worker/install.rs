//! Install phase: create the current store and populate it with seed resources.

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::Serialize;

use super::{CacheWorker, Host, WorkerState};
use crate::http::{CacheMode, Fetch, Request};
use crate::Error;

/// A seed resource that could not be cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SeedFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a completed install.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InstallReport {
    pub store: String,
    pub cached: Vec<String>,
    pub failed: Vec<SeedFailure>,
}

impl<F: Fetch, H: Host> CacheWorker<F, H> {
    /// Open the current store and cache every seed resource.
    ///
    /// Seed fetches bypass intermediate caches and run concurrently; each one
    /// is isolated, so a failure is logged and recorded without affecting the
    /// others. Skip-waiting is signalled only after every fetch has settled.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreOpen` if the store cannot be opened. Nothing is
    /// fetched and skip-waiting is not signalled in that case.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let cache_name = &self.config.cache_name;
        tracing::info!(cache = %cache_name, "install: starting");
        self.set_state(WorkerState::Installing).await;

        let store = match self.current_store().await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(cache = %cache_name, error = %e, "install: failed to open cache store");
                self.set_state(WorkerState::Redundant).await;
                return Err(e);
            }
        };

        tracing::info!(
            cache = %cache_name,
            resources = self.config.seed_resources.len(),
            "install: caching seed resources"
        );

        let store = &store;
        let results = join_all(self.config.seed_resources.iter().map(|url| async move {
            let request = Request::get(url.clone()).with_cache(CacheMode::Reload);
            (url, store.add(&request, &self.fetcher).await)
        }))
        .await;

        let mut report = InstallReport { store: cache_name.clone(), cached: Vec::new(), failed: Vec::new() };
        for (url, result) in results {
            match result {
                Ok(()) => report.cached.push(url.to_string()),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "install: failed to cache seed resource");
                    report.failed.push(SeedFailure { url: url.to_string(), reason: e.to_string() });
                }
            }
        }

        tracing::info!(
            cache = %cache_name,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "install: seed resources processed"
        );

        self.host.skip_waiting().await;
        self.set_state(WorkerState::Installed).await;

        Ok(report)
    }
}
