//! Bearer token lifecycle.
//!
//! [`TokenManager`] is the only reader and writer of the [`CredentialStore`].
//! Tokens are held in memory for the lifetime of the process and are never
//! written to the persistent cache.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::config::{self, SdkConfig};
use crate::error::{Result, SyncError};
use crate::models::{Token, TokenRequest, TokenResponse};
use crate::transport::{ApiRequest, HttpTransport, Method};

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Session-scoped holder for the current token record.
#[derive(Debug, Default)]
pub struct CredentialStore {
    token: RwLock<Option<Token>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Token> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, token: Token) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }

    pub fn clear(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

// ---------------------------------------------------------------------------
// TokenManager
// ---------------------------------------------------------------------------

/// Obtains, caches and refreshes access tokens for the service account.
pub struct TokenManager {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    base_url: String,
    username: String,
    password: String,
    store: CredentialStore,
    // One grant in flight at a time.
    grant_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(config: &SdkConfig, transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            store: CredentialStore::new(),
            grant_lock: Mutex::new(()),
        }
    }

    /// The credential store owned by this manager.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Return a usable access token, requesting a new one if needed.
    ///
    /// A stored token is reused without any network call while
    /// `now < expires_at - 60s`. Otherwise a password grant is performed.
    pub async fn get_access_token(&self) -> Result<String> {
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }

        let _guard = self.grant_lock.lock().await;
        // Another caller may have completed a grant while we waited.
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }
        self.password_grant().await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Never fails because of the refresh itself: without a refresh token, or
    /// when the refresh grant fails for any reason, a password grant is used
    /// instead. Only a failing password grant is reported.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let _guard = self.grant_lock.lock().await;

        let refresh_token = self
            .store
            .get()
            .map(|t| t.refresh_token)
            .filter(|t| !t.is_empty());

        let Some(refresh_token) = refresh_token else {
            return self.password_grant().await;
        };

        match self.refresh_grant(refresh_token).await {
            Ok(token) => Ok(token),
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed; falling back to password grant");
                self.password_grant().await
            }
        }
    }

    /// Drop the stored token.
    pub fn logout(&self) {
        self.store.clear();
        tracing::debug!("cleared stored token");
    }

    fn valid_token(&self) -> Option<String> {
        let now = self.clock.now_ms();
        self.store
            .get()
            .filter(|t| t.is_valid_at(now, config::TOKEN_EXPIRY_BUFFER_MS))
            .map(|t| t.access_token)
    }

    async fn password_grant(&self) -> Result<String> {
        let request = TokenRequest::Password {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        let response = self.request_token(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "password grant failed");
            e
        })?;

        if response.status.as_deref() != Some("success") {
            return Err(SyncError::Authentication("Invalid response".into()));
        }

        Ok(self.store_response(&response))
    }

    async fn refresh_grant(&self, refresh_token: String) -> Result<String> {
        let request = TokenRequest::RefreshToken { refresh_token };
        let response = self.request_token(&request).await?;
        Ok(self.store_response(&response))
    }

    async fn request_token(&self, request: &TokenRequest) -> Result<TokenResponse> {
        let request = ApiRequest {
            method: Method::Post,
            endpoint: config::TOKEN_ENDPOINT.to_string(),
            url: format!("{}{}", self.base_url, config::TOKEN_ENDPOINT),
            bearer: None,
            query: Vec::new(),
            body: Some(serde_json::to_value(request)?),
        };

        let resp = self.transport.send(request).await?;
        if !resp.is_success() {
            return Err(SyncError::Authentication(format!(
                "{} - {}",
                resp.status, resp.body
            )));
        }
        Ok(serde_json::from_str(&resp.body)?)
    }

    fn store_response(&self, response: &TokenResponse) -> String {
        let token = Token::from_response(response, self.clock.now_ms());
        tracing::debug!(expires_at = token.expires_at, "stored new access token");
        let access = token.access_token.clone();
        self.store.set(token);
        access
    }
}
