//! Sweep runner — ticks the expiry sweeper until shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use slotbook_core::config::WorkerConfig;

use crate::jobs::sweep::ExpirySweeper;

/// Periodic driver for [`ExpirySweeper`].
#[derive(Debug)]
pub struct SweepRunner {
    sweeper: Arc<ExpirySweeper>,
    interval: Duration,
}

impl SweepRunner {
    pub fn new(sweeper: Arc<ExpirySweeper>, config: &WorkerConfig) -> Self {
        Self {
            sweeper,
            interval: Duration::from_secs(config.sweep_interval_seconds.max(1)),
        }
    }

    /// Sweep once immediately, then every interval, until `cancel` flips to
    /// `true` or its sender is dropped. An in-flight sweep finishes first.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            interval_seconds = self.interval.as_secs(),
            "Expiry sweeper started"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Expiry sweeper received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweeper.run_once().await {
                        tracing::error!(error = %e, "Sweep failed; retrying next tick");
                    }
                }
            }
        }

        tracing::info!("Expiry sweeper shut down complete");
    }
}
