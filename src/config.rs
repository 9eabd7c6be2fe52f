//! Gateway configuration
//!
//! Two things come from configuration: the log sink and the operator
//! keyword prefix. Stores historically required a marker in front of
//! operator keywords (`$set`, `$in`); the prefix makes that convention
//! configurable.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::observability::{JsonLogger, LogLevel, Logger, TracingLogger};

/// Default operator keyword prefix
pub const DEFAULT_OPERATOR_PREFIX: &str = "$";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings from {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid settings: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "CONFIG_READ_FAILED",
            Self::Parse(_) => "CONFIG_PARSE_FAILED",
        }
    }
}

/// Where log records go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSink {
    #[default]
    None,
    /// JSON lines on stderr
    Json,
    Tracing,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub sink: LogSink,
    /// Only used by the tracing sink
    pub level: LogLevel,
}

/// Serializable form of [`Configuration`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub operator_prefix: String,
    pub logging: LoggingSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            operator_prefix: DEFAULT_OPERATOR_PREFIX.to_string(),
            logging: LoggingSettings::default(),
        }
    }
}

impl GatewaySettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }
}

/// Runtime configuration handed to each gateway.
#[derive(Clone)]
pub struct Configuration {
    pub operator_prefix: String,
    pub logger: Option<Arc<dyn Logger>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            operator_prefix: DEFAULT_OPERATOR_PREFIX.to_string(),
            logger: None,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_operator_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.operator_prefix = prefix.into();
        self
    }

    /// Prefixed operator keyword, e.g. `operator("in")` is `$in`
    pub fn operator(&self, name: &str) -> String {
        format!("{}{}", self.operator_prefix, name)
    }

    /// The update section holding field assignments
    pub fn set_operator(&self) -> String {
        self.operator("set")
    }

    pub fn from_settings(settings: &GatewaySettings) -> Self {
        let logger: Option<Arc<dyn Logger>> = match settings.logging.sink {
            LogSink::None => None,
            LogSink::Json => Some(Arc::new(JsonLogger::stderr())),
            LogSink::Tracing => Some(Arc::new(TracingLogger::new(settings.logging.level))),
        };

        Self {
            operator_prefix: settings.operator_prefix.clone(),
            logger,
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("operator_prefix", &self.operator_prefix)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
