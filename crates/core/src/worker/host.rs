//! Outbound control signals to the hosting environment.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// Receiver of the worker's control signals.
#[async_trait]
pub trait Host: Send + Sync {
    /// Take over as soon as install finishes instead of waiting for the
    /// previous version's clients to close.
    async fn skip_waiting(&self);

    /// Take control of every already-open client, not only new ones.
    async fn claim(&self);
}

/// Host that records the signals it has received.
#[derive(Debug, Default)]
pub struct LocalHost {
    skip_waiting: AtomicBool,
    claimed: AtomicBool,
}

impl LocalHost {
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn skip_waiting(&self) {
        tracing::info!("host: skip-waiting requested, activating immediately");
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    async fn claim(&self) {
        tracing::info!("host: claiming open clients");
        self.claimed.store(true, Ordering::SeqCst);
    }
}
