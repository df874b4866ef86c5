//! Database migration runner.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use slotbook_core::error::{AppError, ErrorKind};

/// Schema migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!(count = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations applied");
    Ok(())
}
