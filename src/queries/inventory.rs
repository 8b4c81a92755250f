//! Inventory-derived reads: prices and availability.

use crate::cache::PersistentCache;
use crate::config::keys;
use crate::error::Result;
use crate::models::{InventoryMap, ProductInventory};

pub struct InventoryQuery<'a> {
    cache: &'a PersistentCache,
}

impl<'a> InventoryQuery<'a> {
    pub fn new(cache: &'a PersistentCache) -> Self {
        Self { cache }
    }

    pub fn all(&self) -> Result<InventoryMap> {
        Ok(self.cache.get(keys::INVENTORY)?.unwrap_or_default())
    }

    pub fn get(&self, product_id: u64) -> Result<Option<ProductInventory>> {
        Ok(self.all()?.remove(&product_id))
    }

    pub fn lowest_price(&self, product_id: u64) -> Result<Option<f64>> {
        Ok(self.get(product_id)?.and_then(|i| i.lowest_price()))
    }

    pub fn is_available(&self, product_id: u64) -> Result<bool> {
        Ok(self.get(product_id)?.is_some_and(|i| i.is_available()))
    }

    pub fn last_sync(&self) -> Result<Option<i64>> {
        self.cache.get_timestamp(keys::LAST_INVENTORY_SYNC)
    }
}
