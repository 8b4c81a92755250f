//! Product catalog sync: initial full crawl, then incremental updates via
//! `modified_since`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::client::QueryParams;
use crate::config::{self, keys};
use crate::error::{Result, SyncFailure};
use crate::models::{DataEnvelope, Product, ProductDetail};

use super::{fetch_all_pages, SyncContext};

// ---------------------------------------------------------------------------
// SyncResult
// ---------------------------------------------------------------------------

/// Outcome of one [`CatalogSync::sync_products`] call.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub success: bool,
    /// The full cached collection after the sync (or the last good snapshot
    /// when the sync failed).
    pub products: Vec<Product>,
    pub message: String,
    pub error: Option<SyncFailure>,
    pub is_incremental: bool,
    /// Products returned by the server during this call.
    pub fetched: usize,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// CatalogSync
// ---------------------------------------------------------------------------

/// Mirrors `/product` into the [`PersistentCache`](crate::cache::PersistentCache).
#[derive(Clone)]
pub struct CatalogSync {
    ctx: SyncContext,
    in_flight: Arc<Mutex<()>>,
}

impl CatalogSync {
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            ctx,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Fetch products and merge them into the cache.
    ///
    /// The first sync (no stored timestamp) replaces the cached collection
    /// with the full listing. Later syncs request only products modified
    /// since the last sync and upsert them by id; products missing from an
    /// incremental response are kept. Never fails: errors are reported in the
    /// returned [`SyncResult`] along with the currently cached products.
    pub async fn sync_products(&self) -> SyncResult {
        let _guard = self.in_flight.lock().await;
        tracing::info!("syncing products");

        match self.try_sync().await {
            Ok(result) => {
                tracing::info!(fetched = result.fetched, total = result.products.len(), "{}", result.message);
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "product sync failed");
                let is_incremental = matches!(self.last_sync(), Ok(Some(_)));
                SyncResult {
                    success: false,
                    products: self.stored_products().unwrap_or_default(),
                    message: "Failed to fetch products".to_string(),
                    error: Some(SyncFailure::from(&e)),
                    is_incremental,
                    fetched: 0,
                    timestamp: self.ctx.now_ms(),
                }
            }
        }
    }

    async fn try_sync(&self) -> Result<SyncResult> {
        let last_sync = self.last_sync()?;
        let is_incremental = last_sync.is_some();

        let mut params = QueryParams::new();
        if let Some(ms) = last_sync {
            params.insert("modified_since", ms.div_euclid(1000));
        }

        let fetched: Vec<Product> =
            fetch_all_pages(&self.ctx.client, config::PRODUCTS_ENDPOINT, params).await?;

        let products = if !is_incremental {
            merge_by_id(Vec::new(), fetched.clone())
        } else if !fetched.is_empty() {
            merge_by_id(self.stored_products()?, fetched.clone())
        } else {
            self.stored_products()?
        };

        let timestamp = self.ctx.now_ms();
        if !fetched.is_empty() {
            self.ctx.cache.set_many(&[
                (keys::PRODUCTS, serde_json::to_string(&products)?),
                (keys::LAST_SYNC, serde_json::to_string(&timestamp)?),
            ])?;
        } else {
            tracing::debug!(is_incremental, "nothing fetched; cache left untouched");
        }

        let message = match (is_incremental, fetched.len()) {
            (true, 0) => "No new products since last sync".to_string(),
            (true, n) => format!(
                "Incremental sync: {} new/updated products ({} total)",
                n,
                products.len()
            ),
            (false, 0) => "No products found".to_string(),
            (false, _) => format!("Full sync: {} products", products.len()),
        };

        Ok(SyncResult {
            success: !products.is_empty() || is_incremental,
            fetched: fetched.len(),
            products,
            message,
            error: None,
            is_incremental,
            timestamp,
        })
    }

    /// Fetch the long-form record for one product. Not cached.
    pub async fn fetch_detail(&self, product_id: u64) -> Result<ProductDetail> {
        let endpoint = format!("{}/{}", config::PRODUCTS_ENDPOINT, product_id);
        let response: DataEnvelope<ProductDetail> =
            self.ctx.client.get(&endpoint, &QueryParams::new()).await?;
        Ok(response.data)
    }

    pub fn stored_products(&self) -> Result<Vec<Product>> {
        Ok(self.ctx.cache.get(keys::PRODUCTS)?.unwrap_or_default())
    }

    /// Epoch milliseconds of the last successful sync that stored products.
    pub fn last_sync(&self) -> Result<Option<i64>> {
        self.ctx.cache.get_timestamp(keys::LAST_SYNC)
    }

    /// Drop cached products and the sync timestamp, so the next sync is a
    /// full crawl.
    pub fn clear(&self) -> Result<()> {
        self.ctx.cache.remove(keys::PRODUCTS)?;
        self.ctx.cache.remove(keys::LAST_SYNC)?;
        tracing::info!("cleared products and sync history");
        Ok(())
    }
}

/// Upsert `updates` into `existing` by product id.
///
/// Existing products keep their position; new ids are appended in the order
/// they arrive. A later duplicate wins over an earlier one.
pub fn merge_by_id(existing: Vec<Product>, updates: Vec<Product>) -> Vec<Product> {
    let mut merged = existing;
    let mut index: HashMap<u64, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    for product in updates {
        match index.get(&product.id) {
            Some(&i) => merged[i] = product,
            None => {
                index.insert(product.id, merged.len());
                merged.push(product);
            }
        }
    }
    merged
}
