// Error taxonomy shared by every layer
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MultiplugError {
    /// Bad or missing input. Nothing was mutated.
    #[error("{0}")]
    Validation(String),

    /// The store could not apply the operation. Safe to retry.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MultiplugError {
    pub fn validation(message: impl Into<String>) -> Self {
        MultiplugError::Validation(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        MultiplugError::Persistence(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, MultiplugError::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, MultiplugError>;
