//! Live ticket pricing and availability for a working set of products.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{self, keys};
use crate::error::{Result, SyncFailure};
use crate::models::{DataEnvelope, InventoryMap, InventoryStatusRequest, ProductInventory};
use crate::queries::InventoryQuery;

use super::SyncContext;

/// Outcome of one [`InventorySync::sync_inventory`] call.
#[derive(Debug, Clone, Serialize)]
pub struct InventorySyncResult {
    pub success: bool,
    pub products_updated: usize,
    /// Number of inventory-status requests issued.
    pub batches: usize,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub error: Option<SyncFailure>,
}

/// Batches `/inventory-status` requests and keeps the cached
/// [`InventoryMap`] current.
#[derive(Clone)]
pub struct InventorySync {
    ctx: SyncContext,
    in_flight: Arc<Mutex<()>>,
}

impl InventorySync {
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            ctx,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Fetch inventory for `product_ids` in batches of at most 100.
    ///
    /// Each returned product's entry replaces the cached one wholesale;
    /// entries for products outside this call are kept. Nothing is written
    /// unless every batch succeeds.
    pub async fn sync_inventory(&self, product_ids: &[u64]) -> InventorySyncResult {
        if product_ids.is_empty() {
            return InventorySyncResult {
                success: true,
                products_updated: 0,
                batches: 0,
                message: "No products to sync".to_string(),
                timestamp: self.ctx.now_ms(),
                error: None,
            };
        }

        let _guard = self.in_flight.lock().await;
        tracing::debug!(products = product_ids.len(), "syncing inventory");

        match self.try_sync(product_ids).await {
            Ok((updated, batches)) => {
                tracing::info!(updated, batches, "synced inventory");
                InventorySyncResult {
                    success: true,
                    products_updated: updated,
                    batches,
                    message: format!("Synced inventory for {} products", updated),
                    timestamp: self.ctx.now_ms(),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "inventory sync failed");
                InventorySyncResult {
                    success: false,
                    products_updated: 0,
                    batches: 0,
                    message: "Failed to fetch inventory status".to_string(),
                    timestamp: self.ctx.now_ms(),
                    error: Some(SyncFailure::from(&e)),
                }
            }
        }
    }

    async fn try_sync(&self, product_ids: &[u64]) -> Result<(usize, usize)> {
        let mut inventory = self.stored_inventory()?;
        let mut fetched: Vec<ProductInventory> = Vec::with_capacity(product_ids.len());
        let mut batches = 0;

        for batch in product_ids.chunks(config::INVENTORY_BATCH_SIZE) {
            let request = InventoryStatusRequest {
                products: batch.to_vec(),
            };
            let response: DataEnvelope<Vec<ProductInventory>> = self
                .ctx
                .client
                .post(config::INVENTORY_ENDPOINT, &request)
                .await?;
            batches += 1;
            tracing::debug!(batch = batch.len(), returned = response.data.len(), "fetched inventory batch");
            fetched.extend(response.data);
        }

        let updated = fetched.len();
        for product in fetched {
            inventory.insert(product.id, product);
        }

        self.ctx.cache.set_many(&[
            (keys::INVENTORY, serde_json::to_string(&inventory)?),
            (keys::LAST_INVENTORY_SYNC, serde_json::to_string(&self.ctx.now_ms())?),
        ])?;

        Ok((updated, batches))
    }

    /// Cache-backed reads over the inventory this routine maintains.
    pub fn query(&self) -> InventoryQuery<'_> {
        InventoryQuery::new(&self.ctx.cache)
    }

    pub fn stored_inventory(&self) -> Result<InventoryMap> {
        self.query().all()
    }

    pub fn product_inventory(&self, product_id: u64) -> Result<Option<ProductInventory>> {
        self.query().get(product_id)
    }

    /// Cheapest available ticket price, `None` when nothing is available.
    pub fn lowest_price(&self, product_id: u64) -> Result<Option<f64>> {
        self.query().lowest_price(product_id)
    }

    pub fn is_available(&self, product_id: u64) -> Result<bool> {
        self.query().is_available(product_id)
    }

    pub fn last_sync(&self) -> Result<Option<i64>> {
        self.query().last_sync()
    }

    pub fn clear(&self) -> Result<()> {
        self.ctx.cache.remove(keys::INVENTORY)?;
        self.ctx.cache.remove(keys::LAST_INVENTORY_SYNC)?;
        tracing::info!("cleared inventory data");
        Ok(())
    }
}
