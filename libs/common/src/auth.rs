//! Session-wide authentication state
//!
//! `AuthProvider` is the single writer of the authentication snapshot.
//! Consumers hold read-only `AuthContext` handles and observe replacements
//! through a `tokio::sync::watch` channel. Refreshing is always explicit.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::ClientResult;
use crate::http::ApiClient;

const ME_PATH: &str = "/api/auth/me/";
const LOGOUT_PATH: &str = "/api/auth/logout/";

/// Authenticated user as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
}

/// Authentication snapshot; replaced wholesale, never patched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

impl AuthSnapshot {
    /// Snapshot for a signed-out session
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Owner of the authentication snapshot
pub struct AuthProvider {
    client: ApiClient,
    sender: watch::Sender<AuthSnapshot>,
}

impl AuthProvider {
    /// Create a provider holding the anonymous snapshot, without fetching
    pub fn new(client: ApiClient) -> Self {
        let (sender, _) = watch::channel(AuthSnapshot::anonymous());
        Self { client, sender }
    }

    /// Create a provider and fetch the session once.
    ///
    /// A failed fetch leaves the anonymous snapshot in place.
    pub async fn init(client: ApiClient) -> Self {
        let provider = Self::new(client);
        if let Err(e) = provider.refresh().await {
            warn!("Initial session fetch failed: {}", e);
        }
        provider
    }

    /// Read-only handle for consumers
    pub fn subscribe(&self) -> AuthContext {
        AuthContext {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn current(&self) -> AuthSnapshot {
        self.sender.borrow().clone()
    }

    /// Fetch the session and replace the snapshot.
    ///
    /// 401 and 403 mean "signed out". Any other failure keeps the previous
    /// snapshot and is returned to the caller.
    pub async fn refresh(&self) -> ClientResult<AuthSnapshot> {
        let response = self.client.get(ME_PATH).await?;

        let snapshot = match response.status.as_u16() {
            401 | 403 => AuthSnapshot::anonymous(),
            _ => {
                let response = response.error_for_status()?;
                serde_json::from_value(response.body)?
            }
        };

        info!(
            "Session refreshed: authenticated={}",
            snapshot.authenticated
        );
        self.sender.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    /// End the session on the server and reset the snapshot.
    ///
    /// The local snapshot is reset even when the server call fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = match self.client.post(LOGOUT_PATH, &serde_json::json!({})).await {
            Ok(response) => response.error_for_status().map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!("Logout request failed: {}", e);
        }

        self.sender.send_replace(AuthSnapshot::anonymous());
        info!("Session cleared");
        result
    }
}

/// Read-only view of the authentication snapshot
#[derive(Clone)]
pub struct AuthContext {
    receiver: watch::Receiver<AuthSnapshot>,
}

impl AuthContext {
    pub fn current(&self) -> AuthSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.receiver.borrow().authenticated
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.receiver.borrow().user.clone()
    }

    /// Wait for the next replacement; `false` once the provider is gone
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    #[test]
    fn test_snapshot_deserializes_with_defaults() {
        let snapshot: AuthSnapshot = serde_json::from_value(serde_json::json!({
            "authenticated": true,
            "user": {"id": 4, "email": "ana@example.com"}
        }))
        .unwrap();

        assert!(snapshot.authenticated);
        let user = snapshot.user.unwrap();
        assert_eq!(user.id, 4);
        assert_eq!(user.username, "");
        assert!(!user.is_staff);

        let empty: AuthSnapshot = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty, AuthSnapshot::anonymous());
    }

    #[tokio::test]
    async fn test_new_provider_starts_anonymous() {
        let client = ApiClient::new(&ApiConfig::new("http://localhost:8000")).unwrap();
        let provider = AuthProvider::new(client);
        let context = provider.subscribe();

        assert_eq!(provider.current(), AuthSnapshot::anonymous());
        assert!(!context.is_authenticated());
        assert!(context.user().is_none());
    }
}
