//! Convenience result type alias for Code Plaza.

use crate::error::AppError;

/// A specialized `Result` type for Code Plaza operations.
pub type AppResult<T> = Result<T, AppError>;
