//! Persisted session records and the key-value store they are read from.
//!
//! The dashboard keeps two kinds of session in local persistent storage: a
//! wallet session (wallet-based sign in) and an admin session (group-gated
//! admin sign in). This crate defines the store abstraction, the record
//! shapes, and a [`SessionResolver`] that applies the wallet-first lookup
//! policy shared by everything that needs the current identity or credential.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod record;
mod resolver;

pub use error::{Error, Result};
pub use record::{
    ADMIN_SESSION_KEY, AdminSession, SessionIdentity, WALLET_SESSION_KEY, WalletSession,
};
pub use resolver::SessionResolver;

use std::error::Error as StdError;
use std::fmt::Debug;

use bytes::Bytes;

/// A synchronous key-value store holding serialized session records.
///
/// Reads happen on the logging hot path, so the trait is deliberately
/// blocking-free from the caller's point of view: implementations should be
/// in-memory or backed by small local files.
///
/// # Associated Types
/// - `Error`: The error type that implements `Debug`, `Error`, `Send`, and `Sync`.
///
/// # Required Methods
/// - `fn del(&self, key) -> Result<(), Self::Error>`: Deletes a key from the store.
/// - `fn get(&self, key) -> Result<Option<Bytes>, Self::Error>`: Retrieves the value associated
///   with a key.
/// - `fn keys(&self) -> Result<Vec<String>, Self::Error>`: Retrieves all keys in the store.
/// - `fn put(&self, key, bytes) -> Result<(), Self::Error>`: Stores a key-value pair.
pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Backend error type.
    type Error: Debug + StdError + Send + Sync + 'static;

    /// Deletes a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the key could not be removed.
    fn del<K: Into<String>>(&self, key: K) -> std::result::Result<(), Self::Error>;

    /// Retrieves the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the value could not be read.
    fn get<K: Into<String>>(&self, key: K) -> std::result::Result<Option<Bytes>, Self::Error>;

    /// Lists every key currently held.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the keys could not be enumerated.
    fn keys(&self) -> std::result::Result<Vec<String>, Self::Error>;

    /// Stores `bytes` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the value could not be written.
    fn put<K: Into<String>>(&self, key: K, bytes: Bytes) -> std::result::Result<(), Self::Error>;
}
