//! Mapping definition errors

use thiserror::Error;

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors raised while loading or registering mapping definitions
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    #[error("Malformed mapping {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("Mapping for {0} is already registered")]
    AlreadyRegistered(String),
}

impl MappingError {
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "MAPPING_MALFORMED",
            Self::AlreadyRegistered(_) => "MAPPING_ALREADY_REGISTERED",
        }
    }
}
