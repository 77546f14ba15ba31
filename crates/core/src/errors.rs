use thiserror::Error;

use crate::config::ConfigError;
use crate::persistence::{PersistenceError, StorageError};
use crate::pricing::PriceMatrixError;

/// Failures that escape to an outer surface (CLI, bootstrap). Handler-level failures never do;
/// the orchestrator turns them into notifications.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    PriceBook(#[from] PriceMatrixError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ApplicationError {
    fn from(value: StorageError) -> Self {
        Self::Persistence(PersistenceError::Storage(value))
    }
}

impl ApplicationError {
    /// Stable class reported by the CLI alongside the message.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::PriceBook(_) => "price_book",
            Self::Persistence(PersistenceError::Storage(_)) | Self::Storage(_) => "storage",
            Self::Persistence(_) => "persistence",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::PriceBook(_) => {
                "The configuration is invalid. Fix it and try again."
            }
            Self::Persistence(_) | Self::Storage(_) => {
                "Quote storage is unavailable. Please retry shortly."
            }
            Self::InvalidInput(_) => "The input could not be processed. Check it and try again.",
            Self::Io(_) => "Input or output failed unexpectedly.",
        }
    }
}
