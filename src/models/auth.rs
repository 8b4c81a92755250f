use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TokenRequest - Body of POST /oauthorize/token
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenRequest {
    Password { username: String, password: String },
    RefreshToken { refresh_token: String },
}

// ---------------------------------------------------------------------------
// TokenResponse - Grant result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Token - Session-scoped credential record
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl Token {
    pub fn from_response(response: &TokenResponse, now_ms: i64) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: now_ms + response.expires_in * 1000,
        }
    }

    /// Valid only while `now < expires_at - buffer`.
    pub fn is_valid_at(&self, now_ms: i64, buffer_ms: i64) -> bool {
        now_ms < self.expires_at - buffer_ms
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
