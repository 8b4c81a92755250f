//! Ticketing API sync SDK for Rust.
//!
//! Authenticates against a sports-ticket vendor API, mirrors the product
//! catalog, live inventory and reference data into a durable DuckDB-backed
//! cache, and serves cache-only queries to a storefront UI.
//!
//! # Quick start
//!
//! ```no_run
//! use ticketsync_sdk::TicketSyncSdk;
//!
//! # async fn example() -> ticketsync_sdk::Result<()> {
//! let sdk = TicketSyncSdk::builder()
//!     .base_url("https://api.example.com/v1")
//!     .credentials("service-user", "secret")
//!     .build()?;
//!
//! // Pull the catalog into the cache
//! let result = sdk.catalog().sync_products().await;
//! println!("{}", result.message);
//!
//! // Read from the cache
//! let upcoming = sdk.products().upcoming_matches()?;
//!
//! // Keep everything fresh in the background
//! let handle = sdk.start_auto_sync(upcoming.iter().map(|p| p.id).collect());
//! # handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod queries;
pub mod scheduler;
pub mod sync;
pub mod transport;

pub use auth::{CredentialStore, TokenManager};
pub use cache::PersistentCache;
pub use client::{ApiClient, QueryParams};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SdkConfig;
pub use error::{ErrorKind, Result, SyncError, SyncFailure};
pub use scheduler::{SchedulerHandle, SchedulerIntervals, SyncScheduler};
pub use sync::{CatalogSync, InventorySync, InventorySyncResult, ReferenceSync, SyncContext, SyncResult};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// TicketSyncSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`TicketSyncSdk`] instance.
///
/// Use [`TicketSyncSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](TicketSyncSdkBuilder::build) to create the SDK.
#[derive(Default)]
pub struct TicketSyncSdkBuilder {
    config: Option<SdkConfig>,
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    environment: Option<String>,
    cache_dir: Option<PathBuf>,
    in_memory: bool,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl TicketSyncSdkBuilder {
    /// Start from a complete configuration, e.g. [`SdkConfig::from_env`].
    ///
    /// Individual setters called afterwards override its fields.
    pub fn config(mut self, config: SdkConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Service account used for the password grant.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/ticketsync-sdk` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the cache in memory instead of on disk. Nothing survives the
    /// process; mainly for tests.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Set the HTTP request timeout.
    ///
    /// Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the reqwest-based transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn resolve_config(&mut self) -> Result<SdkConfig> {
        let mut config = match self.config.take() {
            Some(config) => config,
            None => SdkConfig::new(
                self.base_url.take().unwrap_or_default(),
                self.username.take().unwrap_or_default(),
                self.password.take().unwrap_or_default(),
            ),
        };
        if let Some(url) = self.base_url.take() {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(username) = self.username.take() {
            config.username = username;
        }
        if let Some(password) = self.password.take() {
            config.password = password;
        }
        if let Some(environment) = self.environment.take() {
            config.environment = environment;
        }
        if let Some(dir) = self.cache_dir.take() {
            config.cache_dir = Some(dir);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    /// Build the SDK, opening the cache and wiring the components together.
    ///
    /// Does **not** contact the API; the first token is requested lazily by
    /// the first call that needs one.
    pub fn build(mut self) -> Result<TicketSyncSdk> {
        let config = self.resolve_config()?;

        let transport: Arc<dyn HttpTransport> = match self.transport.take() {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.timeout)?),
        };
        let clock: Arc<dyn Clock> = self.clock.take().unwrap_or_else(|| Arc::new(SystemClock));
        let cache = if self.in_memory {
            PersistentCache::in_memory()?
        } else {
            PersistentCache::open(config.resolved_cache_dir())?
        };
        let cache = Arc::new(cache.with_clock(clock.clone()));

        let tokens = Arc::new(TokenManager::new(&config, transport.clone(), clock.clone()));
        let client = Arc::new(ApiClient::new(&config.base_url, transport, tokens.clone()));
        let ctx = SyncContext::new(client.clone(), cache.clone(), clock.clone());

        tracing::debug!(environment = %config.environment, base_url = %config.base_url, "sdk initialised");

        Ok(TicketSyncSdk {
            catalog: CatalogSync::new(ctx.clone()),
            inventory: InventorySync::new(ctx.clone()),
            reference: ReferenceSync::new(ctx),
            config,
            tokens,
            client,
            cache,
            clock,
        })
    }
}

// ---------------------------------------------------------------------------
// TicketSyncSdk
// ---------------------------------------------------------------------------

/// The main entry point for the SDK.
///
/// Owns one of each process-scoped component (token manager, API client,
/// cache, clock) and hands them to the sync orchestrators and query
/// wrappers.
///
/// Created via [`TicketSyncSdk::builder()`].
pub struct TicketSyncSdk {
    config: SdkConfig,
    tokens: Arc<TokenManager>,
    client: Arc<ApiClient>,
    cache: Arc<PersistentCache>,
    clock: Arc<dyn Clock>,
    catalog: CatalogSync,
    inventory: InventorySync,
    reference: ReferenceSync,
}

impl TicketSyncSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> TicketSyncSdkBuilder {
        TicketSyncSdkBuilder::default()
    }

    // -- Sync orchestrators ------------------------------------------------

    /// Product catalog sync (hourly, incremental after the first crawl).
    pub fn catalog(&self) -> &CatalogSync {
        &self.catalog
    }

    /// Live pricing and availability sync.
    pub fn inventory(&self) -> &InventorySync {
        &self.inventory
    }

    /// Reference data sync (teams, venues, competitions, ...).
    pub fn reference(&self) -> &ReferenceSync {
        &self.reference
    }

    /// A scheduler over this SDK's orchestrators, not yet started.
    pub fn scheduler(&self) -> SyncScheduler {
        SyncScheduler::new(
            self.catalog.clone(),
            self.inventory.clone(),
            self.reference.clone(),
        )
    }

    /// Start the default background timers for `working_set`.
    pub fn start_auto_sync(&self, working_set: Vec<u64>) -> SchedulerHandle {
        self.scheduler().start(working_set)
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the product catalog query interface.
    pub fn products(&self) -> queries::ProductQuery<'_> {
        queries::ProductQuery::new(&self.cache, self.clock.as_ref())
    }

    /// Access the cached inventory query interface.
    pub fn inventory_query(&self) -> queries::InventoryQuery<'_> {
        queries::InventoryQuery::new(&self.cache)
    }

    /// Access the reference data lookup interface.
    pub fn reference_query(&self) -> queries::ReferenceQuery<'_> {
        queries::ReferenceQuery::new(&self.cache)
    }

    // -- Components --------------------------------------------------------

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn cache(&self) -> &PersistentCache {
        &self.cache
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Forget the session token.
    pub fn logout(&self) {
        self.tokens.logout();
    }

    /// Remove every cached collection and timestamp. The next catalog sync
    /// will be a full crawl.
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()?;
        tracing::info!("cache cleared");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for TicketSyncSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = match self.cache.path() {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        };
        write!(
            f,
            "TicketSyncSdk(base_url={}, environment={}, cache={})",
            self.config.base_url, self.config.environment, cache
        )
    }
}
