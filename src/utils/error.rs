use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("Search not found: {id}")]
    JobNotFound { id: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out waiting for {what}")]
    Timeout { what: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn browser(err: impl std::fmt::Display) -> Self {
        AppError::Browser(err.to_string())
    }

    pub fn timeout(what: impl Into<String>) -> Self {
        AppError::Timeout { what: what.into() }
    }

    /// True for errors raised by bad caller input rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::UnknownVendor(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            AppError::Internal(format!("task panicked: {}", err))
        } else {
            AppError::Internal(format!("task cancelled: {}", err))
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
