//! Error handling for the Smart Farm client

use shared::ValidationFailure;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input validation
    #[error("{title}: {message}")]
    Validation { title: String, message: String },

    // Lifecycle errors
    #[error("No farm is selected")]
    NoFarmSelected,

    #[error("No user has been resolved")]
    NoUserResolved,

    #[error("Field {0} does not exist")]
    FieldNotFound(u32),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Collaborator errors
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Local state
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    // Internal errors
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        AppError::Validation {
            title: failure.title,
            message: failure.message,
        }
    }
}

impl AppError {
    /// Title of a validation error, if this is one
    pub fn validation_title(&self) -> Option<&str> {
        match self {
            AppError::Validation { title, .. } => Some(title),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;
