//! Gateway errors

use thiserror::Error;

use crate::driver::DriverError;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures raised by the gateway itself, plus store failures passed
/// through unchanged.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No wrapped or native operation of that name
    #[error("Method {method} does not exist on {target}")]
    UnsupportedOperation { method: String, target: String },

    /// A file-backed type without a mapping for its payload field
    #[error("Type {class} has no field mapping for its file field '{field}'")]
    MissingFieldMapping { class: String, field: String },

    /// A dynamically dispatched call with arguments of the wrong shape
    #[error("Invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl GatewayError {
    pub fn unsupported(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            method: method.into(),
            target: target.into(),
        }
    }

    pub fn invalid_arguments(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code. Store failures keep their driver code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedOperation { .. } => "GATEWAY_UNSUPPORTED_OPERATION",
            Self::MissingFieldMapping { .. } => "GATEWAY_MISSING_FIELD_MAPPING",
            Self::InvalidArguments { .. } => "GATEWAY_INVALID_ARGUMENTS",
            Self::Driver(err) => err.code(),
        }
    }

    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message() {
        let err = GatewayError::unsupported("mapReduce", "docgate::gateway::Gateway");
        assert_eq!(
            err.to_string(),
            "Method mapReduce does not exist on docgate::gateway::Gateway"
        );
        assert_eq!(err.code(), "GATEWAY_UNSUPPORTED_OPERATION");
    }

    #[test]
    fn test_driver_error_is_transparent() {
        let driver = DriverError::Io("disk full".to_string());
        let err: GatewayError = driver.clone().into();
        assert_eq!(err.to_string(), driver.to_string());
        assert_eq!(err.code(), "DRIVER_IO");
        assert!(err.is_driver_error());
    }
}
