//! In-memory implementation of session storage, for tests and for hosts that
//! keep sessions only for the lifetime of the process.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use gavlik_session_store::SessionStore;
use parking_lot::RwLock;

/// In-memory session store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    map: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemorySessionStore {
    /// Creates a new, empty `MemorySessionStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    type Error = Error;

    fn del<K: Into<String>>(&self, key: K) -> Result<(), Self::Error> {
        self.map.write().remove(&key.into());
        Ok(())
    }

    fn get<K: Into<String>>(&self, key: K) -> Result<Option<Bytes>, Self::Error> {
        Ok(self.map.read().get(&key.into()).cloned())
    }

    fn keys(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.map.read().keys().cloned().collect())
    }

    fn put<K: Into<String>>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error> {
        self.map.write().insert(key.into(), bytes);
        Ok(())
    }
}
