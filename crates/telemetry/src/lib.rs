//! Client-side telemetry for the Gavlik Capital dashboard.
//!
//! Log entries are recorded synchronously, enriched with the identity of the
//! active wallet or admin session, and shipped to a remote collector in
//! batches: periodically, right after an error, or on demand. Delivery is
//! best-effort; nothing here ever surfaces a telemetry failure to the caller.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gavlik_session_store_memory::MemorySessionStore;
//! use gavlik_telemetry::{HttpCollector, LogSinkExt, Shipper, ShipperConfig};
//!
//! # async fn run() -> gavlik_telemetry::Result<()> {
//! let config = ShipperConfig::from_env()?;
//! let collector = HttpCollector::new(&config)?;
//! let shipper = Arc::new(Shipper::new(config, MemorySessionStore::new(), collector));
//!
//! shipper.info("dashboard loaded", Some("portfolio"), None);
//! shipper.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod collector;
mod config;
mod entry;
mod error;
mod layer;
mod shipper;
mod sink;

pub use collector::{Collector, HttpCollector};
pub use config::{
    DEFAULT_COLLECTOR_PATH, DEFAULT_COLLECTOR_URL, DEFAULT_FLUSH_INTERVAL, ENV_API_URL,
    ENV_ENVIRONMENT, Environment, ShipperConfig, ShipperConfigBuilder,
};
pub use entry::{LogBatch, LogEntry, LogLevel};
pub use error::{Error, Result};
pub use layer::TelemetryLayer;
pub use shipper::{CONSOLE_TARGET, Shipper, ShipperStats};
pub use sink::{LogSink, LogSinkExt};
