//! Log entry and batch types shipped to the collector

use std::fmt;

use chrono::{DateTime, Utc};
use gavlik_session_store::SessionIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Info level
    Info,
    /// Warn level
    Warn,
    /// Error level
    Error,
    /// Debug level, only recorded in development
    Debug,
}

impl LogLevel {
    /// Lowercase name as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
        }
    }
}

/// A single observation waiting to be shipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Severity
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Subsystem that produced the entry, e.g. `portfolio` or `auth`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Opaque structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Creation instant, serialized as ISO-8601 with millisecond precision
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// User id of the session active at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Wallet address of the session active at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl LogEntry {
    /// Creates an entry stamped with the current time and no identity.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: None,
            data: None,
            timestamp: Utc::now(),
            user_id: None,
            wallet_address: None,
        }
    }

    /// Builder-style method for setting the context label
    #[must_use]
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Builder-style method for setting the payload
    #[must_use]
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    /// Builder-style method for attaching session identity
    #[must_use]
    pub fn with_identity(mut self, identity: SessionIdentity) -> Self {
        self.user_id = identity.user_id;
        self.wallet_address = identity.wallet_address;
        self
    }
}

/// Request body for one delivery: `{"logs": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    /// Entries in creation order
    pub logs: Vec<LogEntry>,
}

impl LogBatch {
    /// Number of entries in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// Whether the batch has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        timestamp: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_entry_wire_shape() {
        let mut entry = LogEntry::new(LogLevel::Warn, "slow quote")
            .with_context(Some("portfolio".to_string()))
            .with_data(Some(json!({ "ms": 1200 })))
            .with_identity(SessionIdentity {
                user_id: Some("u-1".to_string()),
                wallet_address: Some("0xabc".to_string()),
            });
        entry.timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "level": "warn",
                "message": "slow quote",
                "context": "portfolio",
                "data": { "ms": 1200 },
                "timestamp": "2024-03-01T12:30:05.000Z",
                "userId": "u-1",
                "walletAddress": "0xabc",
            })
        );
    }

    #[test]
    fn test_absent_optional_fields_are_omitted() {
        let entry = LogEntry::new(LogLevel::Info, "hello");
        let value = serde_json::to_value(LogBatch { logs: vec![entry] }).unwrap();
        let logged = &value["logs"][0];

        assert_eq!(logged["level"], "info");
        assert!(logged.get("context").is_none());
        assert!(logged.get("data").is_none());
        assert!(logged.get("userId").is_none());
        assert!(logged.get("walletAddress").is_none());
    }

    #[test]
    fn test_timestamp_parses_back() {
        let raw = json!({
            "level": "error",
            "message": "boom",
            "timestamp": "2024-03-01T12:30:05.250Z",
        });

        let entry: LogEntry = serde_json::from_value(raw).unwrap();

        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.timestamp.timestamp_subsec_millis(), 250);
    }
}
