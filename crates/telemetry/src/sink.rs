//! Narrow logging capability handed to code that produces telemetry

use serde_json::Value;

use crate::entry::LogLevel;

/// Something that accepts log entries.
///
/// Producers depend on this trait rather than on a concrete shipper so they
/// can be wired with any sink, including test doubles.
pub trait LogSink: Send + Sync + 'static {
    /// Record an entry. Never blocks on I/O and never fails.
    fn log(&self, level: LogLevel, message: String, context: Option<String>, data: Option<Value>);

    /// Check if a level is recorded at all
    fn is_enabled(&self, _level: LogLevel) -> bool {
        true
    }
}

/// Extension trait for convenient logging methods
pub trait LogSinkExt: LogSink {
    /// Log info
    fn info(&self, message: impl Into<String>, context: Option<&str>, data: Option<Value>) {
        self.log_at(LogLevel::Info, message, context, data);
    }

    /// Log a warning
    fn warn(&self, message: impl Into<String>, context: Option<&str>, data: Option<Value>) {
        self.log_at(LogLevel::Warn, message, context, data);
    }

    /// Log an error
    fn error(&self, message: impl Into<String>, context: Option<&str>, data: Option<Value>) {
        self.log_at(LogLevel::Error, message, context, data);
    }

    /// Log debug
    fn debug(&self, message: impl Into<String>, context: Option<&str>, data: Option<Value>) {
        self.log_at(LogLevel::Debug, message, context, data);
    }

    /// Log at an explicit level, skipping all work when the level is disabled
    fn log_at(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: Option<&str>,
        data: Option<Value>,
    ) {
        if self.is_enabled(level) {
            self.log(level, message.into(), context.map(str::to_owned), data);
        }
    }
}

// Implement for all sinks
impl<T: LogSink + ?Sized> LogSinkExt for T {}
