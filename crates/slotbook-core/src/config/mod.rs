//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod booking;
pub mod database;
pub mod logging;
pub mod payment;
pub mod pricing;
pub mod venue;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::AuthConfig;
pub use self::booking::{BookingConfig, CancellationPolicyConfig};
pub use self::database::{DatabaseConfig, StoreBackend, StoreConfig};
pub use self::logging::LoggingConfig;
pub use self::payment::PaymentConfig;
pub use self::pricing::{PeakWindowConfig, PricingConfig};
pub use self::venue::VenueConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Reservation store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Reservation windows, duration bounds, cancellation policy.
    #[serde(default)]
    pub booking: BookingConfig,
    /// Peak-hour pricing table.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Static venue directory.
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
    /// Payment gateway merchant settings.
    #[serde(default)]
    pub payment: PaymentConfig,
    /// Bearer token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Background sweeper settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SLOTBOOK_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SLOTBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that deserialize fine but cannot run.
    pub fn validate(&self) -> Result<(), AppError> {
        self.booking.validate()?;
        self.pricing.validate()?;
        for venue in &self.venues {
            venue.validate()?;
        }
        if self.store.backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required when store.backend = \"postgres\"",
            ));
        }
        Ok(())
    }
}
