//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Expiry sweeper and maintenance scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether background processing is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Maximum lapsed records handled per sweep query.
    #[serde(default = "default_batch_size")]
    pub sweep_batch_size: i64,
    /// Cron expression (with seconds) for the stale-row maintenance purge.
    #[serde(default = "default_maintenance_cron")]
    pub maintenance_cron: String,
    /// Age in hours after which an unreserved pending row is purged.
    #[serde(default = "default_retention")]
    pub stale_code_retention_hours: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_interval_seconds: default_sweep_interval(),
            sweep_batch_size: default_batch_size(),
            maintenance_cron: default_maintenance_cron(),
            stale_code_retention_hours: default_retention(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    900
}

fn default_batch_size() -> i64 {
    500
}

fn default_maintenance_cron() -> String {
    "0 30 3 * * *".to_string()
}

fn default_retention() -> i64 {
    24
}
