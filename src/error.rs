use thiserror::Error;

/// A failing call against the hosted backend, carrying whatever code and
/// message the provider reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct RemoteOperationError {
    pub code: String,
    pub message: String,
}

impl RemoteOperationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteOperationError {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new("network", message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new("decode", message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Remote(#[from] RemoteOperationError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("not authorized to {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Text shown to the user after a "Failed to ...: " prefix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Remote(remote) => remote.message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type AppResult<T> = Result<T, AppError>;
