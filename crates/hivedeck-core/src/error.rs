//! Error types for the Hivedeck client.

use thiserror::Error;

/// A shared error type for the entire Hivedeck client.
///
/// This provides typed, structured error variants with helper constructors
/// for the common failure paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HivedeckError {
    /// Task submission was rejected or never reached the backend.
    ///
    /// The payload is display-ready text, suitable for appending to the
    /// conversation as-is.
    #[error("Task submission failed: {0}")]
    Submission(String),

    /// A read call (task, agents, status, activity, history) failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HivedeckError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Submission error
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission(message.into())
    }

    /// Creates a Fetch error
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Submission error
    pub fn is_submission(&self) -> bool {
        matches!(self, Self::Submission(_))
    }

    /// Check if this is a Fetch error
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    /// The text a conversation shows when this error reaches the user.
    ///
    /// Submission and fetch errors already carry display-ready text; the
    /// other variants fall back to their full rendering.
    pub fn user_message(&self) -> String {
        match self {
            Self::Submission(text) | Self::Fetch(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for HivedeckError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, HivedeckError>`.
pub type Result<T> = std::result::Result<T, HivedeckError>;
