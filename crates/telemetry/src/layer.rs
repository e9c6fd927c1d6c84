//! `tracing` layer that forwards events into a [`LogSink`]

use std::fmt::Write;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::entry::LogLevel;
use crate::sink::LogSink;

/// Targets never forwarded: the shipper's own diagnostics and the HTTP stack
/// it delivers through. Forwarding those would feed deliveries back into the
/// queue.
const DEFAULT_IGNORED_TARGETS: &[&str] = &[
    "gavlik_telemetry",
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
];

/// Layer turning `tracing` events into telemetry entries.
///
/// The event target becomes the entry context, the `message` field the
/// message, and every other field is collected into a JSON object as data.
/// `TRACE` events are not forwarded.
#[derive(Clone)]
pub struct TelemetryLayer {
    sink: Arc<dyn LogSink>,
    ignored_targets: Vec<String>,
}

impl TelemetryLayer {
    /// Create a layer forwarding into `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            ignored_targets: DEFAULT_IGNORED_TARGETS
                .iter()
                .map(|target| (*target).to_string())
                .collect(),
        }
    }

    /// Also skip events from the module path `prefix` and everything below
    /// it.
    #[must_use]
    pub fn ignore_target(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_targets.push(prefix.into());
        self
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets.iter().any(|prefix| {
            target
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

impl<S> Layer<S> for TelemetryLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let level = match *metadata.level() {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            Level::DEBUG => LogLevel::Debug,
            Level::TRACE => return,
        };

        if !self.sink.is_enabled(level) || self.is_ignored(metadata.target()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let data = if visitor.fields.is_empty() {
            None
        } else {
            Some(Value::Object(visitor.fields))
        };

        self.sink.log(
            level,
            visitor.message,
            Some(metadata.target().to_string()),
            data,
        );
    }
}

/// Visitor splitting the `message` field from the structured fields
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let value = format!("{value:?}");
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }
}
