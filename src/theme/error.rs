//! Theme engine error types

use thiserror::Error;

/// Theme-specific errors
#[derive(Debug, Error)]
pub enum ThemeError {
    /// Override directory missing
    #[error("Template directory not found: {0}")]
    NotFound(String),

    /// Template loading or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),
}
