use serde::{Deserialize, Serialize};

/// Key under which the wallet session record is persisted.
pub const WALLET_SESSION_KEY: &str = "gavlik.walletSession";

/// Key under which the admin session record is persisted.
pub const ADMIN_SESSION_KEY: &str = "gavlik.adminSession";

/// Session created by wallet-based sign in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    /// Bearer token issued for the wallet session.
    pub access_token: String,

    /// Platform user id bound to the wallet, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// The connected wallet address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl WalletSession {
    /// Identity fields this session contributes to log entries.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.user_id.clone(),
            wallet_address: self.wallet_address.clone(),
        }
    }
}

/// Session created by admin sign in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    /// Bearer token issued for the admin session.
    pub access_token: String,

    /// Identity-provider subject of the admin user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Admin e-mail address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AdminSession {
    /// Identity fields this session contributes to log entries.
    ///
    /// Admin sessions never carry a wallet address.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.user_id.clone(),
            wallet_address: None,
        }
    }
}

/// The identity fields attached to a log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    /// User id of the active session.
    pub user_id: Option<String>,

    /// Wallet address of the active session.
    pub wallet_address: Option<String>,
}
