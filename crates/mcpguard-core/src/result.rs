//! Convenience result type alias for MCP Guard.

use crate::error::AppError;

/// A specialized `Result` type for MCP Guard operations.
pub type AppResult<T> = Result<T, AppError>;
