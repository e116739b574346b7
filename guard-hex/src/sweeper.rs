//! Periodic purge of expired guard state.
//!
//! `check_limit` only purges when requests arrive. The sweeper keeps the
//! tables from holding stale entries through idle periods.

use std::sync::Arc;
use std::time::Duration;

use guard_types::{Clock, CsrfSessionStore};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::GuardService;

pub struct Sweeper<S: CsrfSessionStore, C: Clock> {
    service: Arc<GuardService<S, C>>,
    every: Duration,
}

impl<S: CsrfSessionStore, C: Clock> Sweeper<S, C> {
    pub fn new(service: Arc<GuardService<S, C>>, every: Duration) -> Self {
        Self { service, every }
    }

    /// Sweeps every `every` until a shutdown signal arrives.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.every.as_secs(), "Sweeper starting");

        let mut ticker = time::interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.service.sweep();
                    tracing::debug!(
                        rate_limit_entries = report.rate_limit_entries,
                        csrf_sessions = report.csrf_sessions,
                        "swept expired guard state"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
