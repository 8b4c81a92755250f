//! Sync orchestrators.
//!
//! Each orchestrator owns one group of cache entries, reads its entries at the
//! start of an invocation and writes them back when the invocation completes.
//! Request failures are caught here and turned into result records.

pub mod catalog;
pub mod inventory;
pub mod reference;

pub use catalog::{CatalogSync, SyncResult};
pub use inventory::{InventorySync, InventorySyncResult};
pub use reference::ReferenceSync;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::PersistentCache;
use crate::client::{ApiClient, QueryParams};
use crate::clock::Clock;
use crate::config;
use crate::error::Result;
use crate::models::Paginated;

/// Components shared by every sync routine.
#[derive(Clone)]
pub struct SyncContext {
    pub client: Arc<ApiClient>,
    pub cache: Arc<PersistentCache>,
    pub clock: Arc<dyn Clock>,
}

impl SyncContext {
    pub fn new(client: Arc<ApiClient>, cache: Arc<PersistentCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            cache,
            clock,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}

/// Fetch every page of a paginated list endpoint, strictly in order.
///
/// `params` carries any filters; the `page` structure is added here. Stops
/// once the server reports the last page.
pub(crate) async fn fetch_all_pages<T: DeserializeOwned>(
    client: &ApiClient,
    endpoint: &str,
    mut params: QueryParams,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut page = 1u32;

    loop {
        params.page(page, config::PAGE_SIZE);
        let response: Paginated<T> = client.get(endpoint, &params).await?;
        let count = response.data.len();
        let meta = response.meta.clone();
        let has_more = response.has_more();
        items.extend(response.data);

        tracing::debug!(
            endpoint,
            page = meta.current_page,
            last_page = meta.last_page,
            count,
            "fetched page"
        );

        // A server that ignores the page parameter must not loop us forever.
        if !has_more || page >= meta.last_page {
            break;
        }
        page += 1;
    }

    Ok(items)
}
