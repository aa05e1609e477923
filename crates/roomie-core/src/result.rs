//! Convenience result type alias for Roomie.

use crate::error::AppError;

/// A specialized `Result` type for Roomie operations.
pub type AppResult<T> = Result<T, AppError>;
