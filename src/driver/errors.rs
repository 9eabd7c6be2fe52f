//! Driver errors

use thiserror::Error;

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Store-level failures. The gateway never handles these; they reach the
/// caller unchanged.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Command {command} failed: {message}")]
    Command { command: String, message: String },

    #[error("Operation {0} is not supported")]
    Unsupported(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DriverError {
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "DRIVER_IO",
            Self::Command { .. } => "DRIVER_COMMAND_FAILED",
            Self::Unsupported(_) => "DRIVER_UNSUPPORTED",
            Self::InvalidDocument(_) => "DRIVER_INVALID_DOCUMENT",
            Self::LockPoisoned => "DRIVER_LOCK_POISONED",
            Self::Internal(_) => "DRIVER_INTERNAL",
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
