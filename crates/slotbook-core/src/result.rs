//! Convenience result type alias for Slotbook.

use crate::error::AppError;

/// A specialized `Result` type for Slotbook operations.
pub type AppResult<T> = Result<T, AppError>;
