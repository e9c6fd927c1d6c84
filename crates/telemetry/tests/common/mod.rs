//! Shared fixtures for the shipper integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use gavlik_session_store::{
    ADMIN_SESSION_KEY, AdminSession, SessionStore, WALLET_SESSION_KEY, WalletSession,
};
use gavlik_session_store_memory::MemorySessionStore;
use gavlik_telemetry::{Collector, Environment, Error, LogBatch, Result, ShipperConfig};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Collector that records every flight and can hold deliveries open or fail
/// them.
#[derive(Default)]
pub struct RecordingCollector {
    flights: Mutex<Vec<(LogBatch, String)>>,
    gate: Option<Semaphore>,
    fail: bool,
}

impl RecordingCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliveries block until [`RecordingCollector::release`] is called.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        })
    }

    /// Every delivery fails with a 502.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn release(&self, flights: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(flights);
        }
    }

    pub fn flights(&self) -> usize {
        self.flights.lock().len()
    }

    pub fn batch(&self, index: usize) -> LogBatch {
        self.flights.lock()[index].0.clone()
    }

    pub fn token(&self, index: usize) -> String {
        self.flights.lock()[index].1.clone()
    }

    pub fn messages(&self, index: usize) -> Vec<String> {
        self.batch(index)
            .logs
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }

    /// Wait until at least `count` flights have started.
    pub async fn wait_for_flights(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.flights() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for deliveries");
    }
}

#[async_trait]
impl Collector for RecordingCollector {
    async fn deliver(&self, batch: &LogBatch, token: &str) -> Result<()> {
        self.flights.lock().push((batch.clone(), token.to_string()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if self.fail {
            return Err(Error::Status(reqwest::StatusCode::BAD_GATEWAY));
        }

        Ok(())
    }
}

/// Production config with a timer that never fires during a test.
pub fn quiet_config() -> ShipperConfig {
    ShipperConfig::builder()
        .environment(Environment::Production)
        .echo_to_console(false)
        .flush_interval(Duration::from_secs(3600))
        .build()
}

pub fn wallet_session() -> WalletSession {
    WalletSession {
        access_token: "wallet-token".to_string(),
        user_id: Some("user-42".to_string()),
        wallet_address: Some("0x5eed".to_string()),
    }
}

pub fn admin_session() -> AdminSession {
    AdminSession {
        access_token: "admin-token".to_string(),
        user_id: Some("admin-sub".to_string()),
        email: Some("ops@gavlik.example".to_string()),
    }
}

pub fn store_with(
    wallet: Option<&WalletSession>,
    admin: Option<&AdminSession>,
) -> MemorySessionStore {
    let store = MemorySessionStore::new();
    if let Some(wallet) = wallet {
        store
            .put(WALLET_SESSION_KEY, Bytes::from(serde_json::to_vec(wallet).unwrap()))
            .unwrap();
    }
    if let Some(admin) = admin {
        store
            .put(ADMIN_SESSION_KEY, Bytes::from(serde_json::to_vec(admin).unwrap()))
            .unwrap();
    }
    store
}

/// Layer counting events at one level from one target.
#[derive(Clone)]
pub struct EventCounter {
    level: Level,
    target: &'static str,
    count: Arc<AtomicUsize>,
}

impl EventCounter {
    pub fn new(level: Level, target: &'static str) -> Self {
        Self {
            level,
            target,
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for EventCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == self.level && metadata.target() == self.target {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
