//! Store error types

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected by schema or business rules (maps to HTTP 400)
    #[error("{0}")]
    Invalid(String),

    #[error("Ingredient '{0}' already exists")]
    DuplicateIngredient(String),

    #[error("Cannot delete ingredient that is used in recipes")]
    IngredientInUse,

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an Invalid error from anything string-like
    pub fn invalid(message: impl Into<String>) -> Self {
        StoreError::Invalid(message.into())
    }

    /// Check if this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::Invalid(_) | StoreError::DuplicateIngredient(_) | StoreError::IngredientInUse
        )
    }
}
