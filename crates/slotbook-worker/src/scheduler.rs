//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use slotbook_core::error::AppError;

use crate::jobs::maintenance::StalePurgeJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Stale unreserved row purge on `cron` (six fields, seconds first)
    pub async fn register_stale_purge(
        &self,
        cron: &str,
        job: Arc<StalePurgeJob>,
    ) -> Result<(), AppError> {
        let schedule = CronJob::new_async(cron, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                if let Err(e) = job.run().await {
                    tracing::error!(error = %e, "Stale purge failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid maintenance cron '{}': {}", cron, e))
        })?;

        self.scheduler.add(schedule).await.map_err(|e| {
            AppError::internal(format!("Failed to add stale_purge schedule: {}", e))
        })?;

        tracing::info!(cron, "Registered: stale_purge");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
