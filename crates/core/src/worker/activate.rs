//! Activation phase: garbage-collect stores from previous versions.

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::Serialize;

use super::{CacheWorker, Host, WorkerState};
use crate::http::Fetch;
use crate::Error;

/// Outcome of a completed activation.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ActivateReport {
    /// The current store name.
    pub kept: String,
    /// Stale stores that were removed.
    pub deleted: Vec<String>,
}

impl<F: Fetch, H: Host> CacheWorker<F, H> {
    /// Delete every store whose name differs from the current version stamp,
    /// then claim all open clients.
    ///
    /// Deletions run concurrently and are joined before claiming. Unlike seed
    /// fetches during install they are not isolated: the first failure aborts
    /// activation, no claim is signalled and the previous state is restored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` without touching any store if the worker
    /// is redundant, and the deletion error if pruning fails.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let cache_name = &self.config.cache_name;
        let previous = self.state().await;
        if previous == WorkerState::Redundant {
            tracing::warn!(cache = %cache_name, "activate: refusing to activate a redundant worker");
            return Err(Error::InvalidInput(format!("worker for {cache_name} is redundant")));
        }

        tracing::info!(cache = %cache_name, "activate: starting");
        self.set_state(WorkerState::Activating).await;

        match self.prune_stale_stores().await {
            Ok(deleted) => {
                tracing::info!(
                    cache = %cache_name,
                    deleted = deleted.len(),
                    "activate: stale caches removed, claiming clients"
                );
                self.host.claim().await;
                self.set_state(WorkerState::Activated).await;
                Ok(ActivateReport { kept: cache_name.clone(), deleted })
            }
            Err(e) => {
                tracing::error!(cache = %cache_name, error = %e, "activate: failed to remove stale caches");
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn prune_stale_stores(&self) -> Result<Vec<String>, Error> {
        let stale: Vec<String> = self
            .db
            .store_names()
            .await?
            .into_iter()
            .filter(|name| *name != self.config.cache_name)
            .collect();

        let removed = try_join_all(stale.iter().map(|name| async move {
            tracing::info!(cache = %name, "activate: deleting stale cache");
            self.db.delete_store(name).await
        }))
        .await?;

        Ok(stale
            .into_iter()
            .zip(removed)
            .filter_map(|(name, removed)| removed.then_some(name))
            .collect())
    }
}
