//! Log sinks
//!
//! - `JsonLogger`: one JSON object per line, synchronous, flushed per record
//! - `TracingLogger`: forwards records as `tracing` events
//! - `MemoryLogger`: keeps records in memory for tests

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;

use super::logger::{LogRecord, Logger};

/// Writes each record as a single JSON line.
///
/// Write failures are ignored; logging never fails an operation.
pub struct JsonLogger<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLogger<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl JsonLogger<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> JsonLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Logger for JsonLogger<W> {
    fn log(&self, record: &LogRecord) {
        let mut line = record.to_json_line();
        line.push('\n');

        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // One write per record
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

/// Level used when forwarding records to `tracing`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
}

/// Forwards records to the `tracing` ecosystem under the `docgate` target.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    level: LogLevel,
}

impl TracingLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl Logger for TracingLogger {
    fn log(&self, record: &LogRecord) {
        let line = record.to_json_line();
        match self.level {
            LogLevel::Trace => tracing::trace!(target: "docgate", record = %line),
            LogLevel::Debug => tracing::debug!(target: "docgate", record = %line),
            LogLevel::Info => tracing::info!(target: "docgate", record = %line),
        }
    }
}

/// In-memory sink for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, record: &LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_logger_one_line_per_record() {
        let logger = JsonLogger::new(Vec::new());
        logger.log(&LogRecord::new().with("a", 1));
        logger.log(&LogRecord::new().with("b", "two"));

        let output = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["b"], "two");
    }

    #[test]
    fn test_json_logger_escapes_special_chars() {
        let logger = JsonLogger::new(Vec::new());
        logger.log(&LogRecord::new().with("message", "hello \"world\"\nline2"));

        let output = String::from_utf8(logger.into_inner()).unwrap();
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["message"], "hello \"world\"\nline2");
    }

    #[test]
    fn test_memory_logger_keeps_order() {
        let logger = MemoryLogger::new();
        logger.log(&LogRecord::new().with("n", 1));
        logger.log(&LogRecord::new().with("n", 2));

        let records = logger.records();
        assert_eq!(records[0].get("n").unwrap(), 1);
        assert_eq!(records[1].get("n").unwrap(), 2);

        logger.clear();
        assert!(logger.is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedEvents(Arc<Mutex<Vec<(tracing::Level, String, String)>>>);

    struct RecordField(String);

    impl tracing::field::Visit for RecordField {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "record" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturedEvents {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut field = RecordField(String::new());
            event.record(&mut field);
            let meta = event.metadata();
            self.0
                .lock()
                .unwrap()
                .push((*meta.level(), meta.target().to_string(), field.0));
        }
    }

    #[test]
    fn test_tracing_logger_emits_record_at_level() {
        use tracing_subscriber::layer::SubscriberExt;

        let captured = CapturedEvents::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        tracing::subscriber::with_default(subscriber, || {
            TracingLogger::new(LogLevel::Debug).log(&LogRecord::new().with("x", true));
            TracingLogger::new(LogLevel::Info).log(&LogRecord::new().with("y", 2));
        });

        let events = captured.0.lock().unwrap();
        assert_eq!(events.len(), 2);

        let (level, target, record) = &events[0];
        assert_eq!(*level, tracing::Level::DEBUG);
        assert_eq!(target, "docgate");
        let parsed: serde_json::Value = serde_json::from_str(record).unwrap();
        assert_eq!(parsed["x"], true);

        assert_eq!(events[1].0, tracing::Level::INFO);
        let parsed: serde_json::Value = serde_json::from_str(&events[1].2).unwrap();
        assert_eq!(parsed["y"], 2);
    }
}
