//! Error types and handling for the itinerary planner

use thiserror::Error;

use crate::composer::ComposeError;
use crate::storage::StoreError;

/// Main error type at the request boundary
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Missing or malformed request input
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Unknown destination, itinerary or user
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Uniqueness violation
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Document store failures
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl PlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// The bare message, as sent to clients in the `error` field
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            PlannerError::Config { message }
            | PlannerError::Validation { message }
            | PlannerError::NotFound { message }
            | PlannerError::Conflict { message }
            | PlannerError::Storage { message } => message,
        }
    }
}

impl From<ComposeError> for PlannerError {
    fn from(err: ComposeError) -> Self {
        // composer failures are reported against the request
        PlannerError::validation(err.to_string())
    }
}

impl From<StoreError> for PlannerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => PlannerError::conflict(err.to_string()),
            StoreError::Backend(_) => PlannerError::storage(err.to_string()),
        }
    }
}
