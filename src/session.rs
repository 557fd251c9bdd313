use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Source of the current GitHub token
///
/// The workspace asks for the token on every operation, so signing in or
/// out takes effect on the next call.
pub trait Session: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Parameters for an interactive sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub provider: String,
    pub scope: String,
}

impl Default for AuthRequest {
    fn default() -> Self {
        Self {
            provider: "github".to_string(),
            scope: "public_repo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub provider: String,
}

/// Performs the OAuth handshake; supplied by the embedding application
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthGrant>;
}

/// In-memory token holder
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Sign out
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub async fn sign_in(
        &self,
        authenticator: &dyn Authenticator,
        request: AuthRequest,
    ) -> Result<AuthGrant> {
        let grant = authenticator.authenticate(&request).await?;
        self.set_token(grant.token.clone());
        info!("signed in through {}", grant.provider);
        Ok(grant)
    }
}

impl Session for TokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone().filter(|t| !t.trim().is_empty())
    }
}
