use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded - please wait before retrying")]
    RateLimited,

    #[error("HTTP error! status: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] duckdb::Error),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Coarse classification, carried by sync results in place of the error itself.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::Http { .. } => ErrorKind::Http,
            Self::Network(_) | Self::Io(_) => ErrorKind::Network,
            Self::Json(_) => ErrorKind::Parse,
            Self::Cache(_) | Self::CacheUnavailable(_) => ErrorKind::Cache,
            Self::NotFound(_) | Self::InvalidArgument(_) | Self::Config(_) => ErrorKind::Other,
        }
    }

    /// HTTP status for errors that came back from the API.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited => Some(429),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    RateLimited,
    Http,
    Network,
    Parse,
    Cache,
    Other,
}

/// Inspectable failure attached to a sync result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SyncError> for SyncFailure {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
