use crate::error::{Error, Result};
use crate::record::{
    ADMIN_SESSION_KEY, AdminSession, SessionIdentity, WALLET_SESSION_KEY, WalletSession,
};
use crate::SessionStore;

use serde::de::DeserializeOwned;

/// Reads session records from a [`SessionStore`] with wallet-first precedence.
///
/// The wallet session is consulted first and the admin session second; the
/// first record present wins. A record that is present but malformed stops the
/// lookup with [`Error::Deserialize`] rather than silently falling through to
/// the next record.
#[derive(Clone, Debug)]
pub struct SessionResolver<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionResolver<S> {
    /// Creates a resolver over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reads the wallet session record.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the record is malformed.
    pub fn wallet_session(&self) -> Result<Option<WalletSession>, S::Error> {
        self.read(WALLET_SESSION_KEY)
    }

    /// Reads the admin session record.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the record is malformed.
    pub fn admin_session(&self) -> Result<Option<AdminSession>, S::Error> {
        self.read(ADMIN_SESSION_KEY)
    }

    /// Identity of the active session, if any.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the winning record is malformed.
    pub fn identity(&self) -> Result<Option<SessionIdentity>, S::Error> {
        if let Some(wallet) = self.wallet_session()? {
            return Ok(Some(wallet.identity()));
        }

        Ok(self.admin_session()?.map(|admin| admin.identity()))
    }

    /// Bearer token of the active session, if any.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the winning record is malformed.
    pub fn access_token(&self) -> Result<Option<String>, S::Error> {
        if let Some(wallet) = self.wallet_session()? {
            return Ok(Some(wallet.access_token));
        }

        Ok(self.admin_session()?.map(|admin| admin.access_token))
    }

    fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, S::Error> {
        let Some(bytes) = self.store.get(key).map_err(Error::Backend)? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Deserialize(key, e))
    }
}
