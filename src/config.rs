use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SyncError};

pub const TOKEN_ENDPOINT: &str = "/oauthorize/token";
pub const PRODUCTS_ENDPOINT: &str = "/product";
pub const INVENTORY_ENDPOINT: &str = "/inventory-status";
pub const TEAMS_ENDPOINT: &str = "/teams";
pub const VENUES_ENDPOINT: &str = "/venues";
pub const COMPETITIONS_ENDPOINT: &str = "/competitions";
pub const COUNTRIES_ENDPOINT: &str = "/countries";
pub const TICKET_CATEGORIES_ENDPOINT: &str = "/ticket-categories";
pub const DELIVERY_METHODS_ENDPOINT: &str = "/delivery-methods";

/// Durable cache keys.
pub mod keys {
    pub const PRODUCTS: &str = "tc_products";
    pub const LAST_SYNC: &str = "tc_last_sync";
    pub const INVENTORY: &str = "tc_inventory";
    pub const LAST_INVENTORY_SYNC: &str = "tc_last_inventory_sync";
    pub const STATIC_DATA: &str = "tc_static_data";
}

pub const PAGE_SIZE: u32 = 100;
/// Server-imposed limit on ids per inventory-status request.
pub const INVENTORY_BATCH_SIZE: usize = 100;
/// Tokens are treated as expired this long before their stated expiry.
pub const TOKEN_EXPIRY_BUFFER_MS: i64 = 60 * 1000;
pub const STATIC_DATA_MAX_AGE_MS: i64 = 24 * 60 * 60 * 1000;

pub const CATALOG_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const REFERENCE_SYNC_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const INVENTORY_SYNC_INTERVAL: Duration = Duration::from_secs(60);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const CACHE_DB_FILE: &str = "ticketsync.duckdb";

pub const ENV_BASE_URL: &str = "TICKETSYNC_API_BASE_URL";
pub const ENV_USERNAME: &str = "TICKETSYNC_API_USERNAME";
pub const ENV_PASSWORD: &str = "TICKETSYNC_API_PASSWORD";
pub const ENV_ENVIRONMENT: &str = "TICKETSYNC_ENV";

/// Connection settings supplied at process start.
#[derive(Clone)]
pub struct SdkConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Free-form deployment tag, e.g. `sandbox` or `production`.
    pub environment: String,
    pub cache_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl SdkConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            environment: "sandbox".to_string(),
            cache_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the configuration from `TICKETSYNC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required_env(ENV_BASE_URL)?,
            required_env(ENV_USERNAME)?,
            required_env(ENV_PASSWORD)?,
        );
        if let Ok(environment) = env::var(ENV_ENVIRONMENT) {
            if !environment.trim().is_empty() {
                config.environment = environment.trim().to_string();
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(SyncError::Config("base URL is empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(SyncError::Config("service credentials are missing".into()));
        }
        Ok(())
    }

    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

// Credentials stay out of debug output.
impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("environment", &self.environment)
            .field("cache_dir", &self.cache_dir)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(SyncError::Config(format!("{} is not set", name))),
    }
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("ticketsync-sdk")
    } else {
        PathBuf::from(".ticketsync-sdk-cache")
    }
}
