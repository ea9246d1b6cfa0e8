//! Client error types

use thiserror::Error;

/// Errors surfaced by the client
///
/// Messages are shown to the user verbatim, so `Request` displays only the
/// server's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    /// Rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Another request is still in progress")]
    InFlight,
}

impl RecipeError {
    pub fn validation(message: impl Into<String>) -> Self {
        RecipeError::Validation(message.into())
    }

    /// Check if this error was raised before reaching the network
    pub fn is_validation(&self) -> bool {
        matches!(self, RecipeError::Validation(_))
    }

    /// HTTP status of a failed request, if there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            RecipeError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for RecipeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RecipeError::Decode(err.to_string())
        } else {
            RecipeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RecipeError {
    fn from(err: serde_json::Error) -> Self {
        RecipeError::Decode(err.to_string())
    }
}
