//! Batched, best-effort shipping of log entries to the collector

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use gavlik_session_store::{SessionResolver, SessionStore};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use crate::collector::Collector;
use crate::config::ShipperConfig;
use crate::entry::{LogBatch, LogEntry, LogLevel};
use crate::sink::LogSink;

/// Target used when entries are echoed to the local `tracing` sink.
pub const CONSOLE_TARGET: &str = "gavlik_telemetry::console";

/// Snapshot of delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipperStats {
    /// Batches the collector accepted
    pub batches_sent: u64,
    /// Batches dropped after a failed delivery
    pub batches_dropped: u64,
    /// Entries the collector accepted
    pub entries_sent: u64,
    /// Entries dropped after a failed delivery
    pub entries_dropped: u64,
}

/// Buffers log entries and ships them to a [`Collector`] in batches.
///
/// Entries are delivered when the periodic timer fires, immediately after an
/// error-level entry, or on an explicit [`Shipper::flush`]. Delivery is
/// at-most-once: a failed batch is reported locally and dropped.
///
/// The timer runs only if a Tokio runtime is current when the shipper is
/// created. It is cancelled by [`Shipper::destroy`], [`Shipper::shutdown`], or
/// dropping the shipper.
pub struct Shipper<S: SessionStore, C: Collector> {
    inner: Arc<Inner<S, C>>,
    runtime: Option<Handle>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<S, C> Shipper<S, C>
where
    S: SessionStore,
    C: Collector,
{
    /// Create a new shipper reading session context from `store` and
    /// delivering to `collector`.
    pub fn new(config: ShipperConfig, store: S, collector: C) -> Self {
        let inner = Arc::new(Inner {
            config,
            sessions: SessionResolver::new(store),
            collector,
            queue: Mutex::new(Queue::default()),
            in_flight: AtomicBool::new(false),
            counters: Counters::default(),
        });

        let shutdown_token = CancellationToken::new();
        let task_tracker = TaskTracker::new();
        let runtime = Handle::try_current().ok();

        if let Some(runtime) = &runtime {
            task_tracker.spawn_on(
                flush_timer(inner.clone(), shutdown_token.clone()),
                runtime,
            );
        } else {
            debug!("no async runtime available; periodic flushing disabled");
        }

        task_tracker.close();

        Self {
            inner,
            runtime,
            shutdown_token,
            task_tracker,
        }
    }

    /// Ship everything queued so far.
    ///
    /// Returns immediately if the queue is empty or another flight is in
    /// progress. Otherwise the queue is swapped out before the network call,
    /// so entries logged meanwhile start the next batch.
    pub async fn flush(&self) {
        self.inner.flush().await;
    }

    /// Cancel the periodic timer and start one final flush without waiting
    /// for it. Safe to call more than once.
    pub fn destroy(&self) {
        self.shutdown_token.cancel();
        self.spawn_flush();
    }

    /// Cancel the periodic timer, wait for running flushes, then flush once
    /// more and wait for that delivery to finish.
    pub async fn shutdown(&self) {
        info!("telemetry shipper shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;
        self.inner.flush().await;

        info!("telemetry shipper shutdown complete.");
    }

    /// Number of entries waiting for the next batch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().entries.len()
    }

    /// Whether a delivery is currently in flight.
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Delivery counters so far.
    #[must_use]
    pub fn stats(&self) -> ShipperStats {
        self.inner.counters.snapshot()
    }

    /// The configuration this shipper was built with.
    #[must_use]
    pub fn config(&self) -> &ShipperConfig {
        &self.inner.config
    }

    fn spawn_flush(&self) {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            debug!("no async runtime available; flush deferred to the next explicit call");
            return;
        };

        let inner = self.inner.clone();
        self.task_tracker
            .spawn_on(async move { inner.flush().await }, &runtime);
    }
}

impl<S, C> LogSink for Shipper<S, C>
where
    S: SessionStore,
    C: Collector,
{
    fn log(&self, level: LogLevel, message: String, context: Option<String>, data: Option<Value>) {
        if self.inner.record(level, message, context, data) && level == LogLevel::Error {
            self.spawn_flush();
        }
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.inner.is_enabled(level)
    }
}

impl<S, C> Drop for Shipper<S, C>
where
    S: SessionStore,
    C: Collector,
{
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

struct Inner<S: SessionStore, C: Collector> {
    config: ShipperConfig,
    sessions: SessionResolver<S>,
    collector: C,
    queue: Mutex<Queue>,
    in_flight: AtomicBool,
    counters: Counters,
}

#[derive(Default)]
struct Queue {
    entries: Vec<LogEntry>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<S, C> Inner<S, C>
where
    S: SessionStore,
    C: Collector,
{
    fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Debug || self.config.environment.is_development()
    }

    /// Build, enrich and enqueue an entry. Returns whether it was recorded.
    fn record(
        &self,
        level: LogLevel,
        message: String,
        context: Option<String>,
        data: Option<Value>,
    ) -> bool {
        if !self.is_enabled(level) {
            return false;
        }

        let mut entry = LogEntry::new(level, message)
            .with_context(context)
            .with_data(data);

        match self.sessions.identity() {
            Ok(Some(identity)) => entry = entry.with_identity(identity),
            Ok(None) => {}
            Err(e) => trace!("session context unavailable: {}", e),
        }

        if self.config.echo_to_console {
            echo(&entry);
        }

        let mut queue = self.queue.lock();
        // Wall clock may step backwards; creation order must stay monotonic.
        if let Some(last) = queue.last_timestamp {
            if entry.timestamp < last {
                entry.timestamp = last;
            }
        }
        queue.last_timestamp = Some(entry.timestamp);
        queue.entries.push(entry);

        true
    }

    fn should_flush(&self) -> bool {
        !self.in_flight.load(Ordering::Acquire) && !self.queue.lock().entries.is_empty()
    }

    fn take_batch(&self) -> Vec<LogEntry> {
        std::mem::take(&mut self.queue.lock().entries)
    }

    fn access_token(&self) -> String {
        match self.sessions.access_token() {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                debug!("credential lookup failed, sending without one: {}", e);
                String::new()
            }
        }
    }

    async fn flush(&self) {
        let Some(_flight) = Flight::claim(&self.in_flight) else {
            trace!("flush skipped: delivery already in flight");
            return;
        };

        let logs = self.take_batch();
        if logs.is_empty() {
            return;
        }

        let batch = LogBatch { logs };
        let count = batch.len() as u64;
        let token = self.access_token();

        match self.collector.deliver(&batch, &token).await {
            Ok(()) => {
                self.counters.batches_sent.fetch_add(1, Ordering::Relaxed);
                self.counters.entries_sent.fetch_add(count, Ordering::Relaxed);
                debug!("shipped log batch with {} entries", count);
            }
            Err(e) => {
                self.counters.batches_dropped.fetch_add(1, Ordering::Relaxed);
                self.counters.entries_dropped.fetch_add(count, Ordering::Relaxed);
                warn!("failed to ship log batch, dropping {} entries: {}", count, e);
            }
        }
    }
}

/// Marks a delivery as in flight for as long as it is held.
struct Flight<'a>(&'a AtomicBool);

impl<'a> Flight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct Counters {
    batches_sent: AtomicU64,
    batches_dropped: AtomicU64,
    entries_sent: AtomicU64,
    entries_dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ShipperStats {
        ShipperStats {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            entries_sent: self.entries_sent.load(Ordering::Relaxed),
            entries_dropped: self.entries_dropped.load(Ordering::Relaxed),
        }
    }
}

async fn flush_timer<S, C>(inner: Arc<Inner<S, C>>, shutdown_token: CancellationToken)
where
    S: SessionStore,
    C: Collector,
{
    let period = inner.config.flush_interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = shutdown_token.cancelled() => break,
            _ = ticker.tick() => {
                if inner.should_flush() {
                    inner.flush().await;
                }
            }
        }
    }

    trace!("flush timer stopped");
}

fn echo(entry: &LogEntry) {
    let context = entry.context.as_deref().unwrap_or("-");
    let data = &entry.data;
    let message = &entry.message;
    match entry.level {
        LogLevel::Error => error!(target: CONSOLE_TARGET, context, ?data, "{message}"),
        LogLevel::Warn => warn!(target: CONSOLE_TARGET, context, ?data, "{message}"),
        LogLevel::Info => info!(target: CONSOLE_TARGET, context, ?data, "{message}"),
        LogLevel::Debug => debug!(target: CONSOLE_TARGET, context, ?data, "{message}"),
    }
}
