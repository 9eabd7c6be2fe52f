//! Observability for the gateway
//!
//! - Structured log records with deterministic key ordering
//! - Pluggable sinks (JSON lines, `tracing`, in-memory)
//! - Records are enriched with the mapped type's name, database and
//!   collection so every line is self-describing
//!
//! With no sink configured nothing is built or written.

mod logger;
mod sinks;

pub use logger::{ContextLogger, LogRecord, Logger};
pub use sinks::{JsonLogger, LogLevel, MemoryLogger, TracingLogger};
