use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::product::MatchStatus;

/// Product id -> latest inventory snapshot for that product.
pub type InventoryMap = BTreeMap<u64, ProductInventory>;

// ---------------------------------------------------------------------------
// InventoryStatusRequest - Body of POST /inventory-status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryStatusRequest {
    pub products: Vec<u64>,
}

// ---------------------------------------------------------------------------
// ProductInventory - Live pricing and availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInventory {
    pub id: u64,
    pub status: MatchStatus,
    #[serde(default)]
    pub ticket_options: Vec<TicketOption>,
}

impl ProductInventory {
    /// Cheapest price among available options.
    pub fn lowest_price(&self) -> Option<f64> {
        self.ticket_options
            .iter()
            .filter(|option| option.available)
            .map(|option| option.price)
            .fold(None, |lowest: Option<f64>, price| match lowest {
                Some(current) if current <= price => Some(current),
                _ => Some(price),
            })
    }

    pub fn is_available(&self) -> bool {
        self.ticket_options.iter().any(|option| option.available)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketOption {
    pub id: u64,
    pub ticket_category: u64,
    pub name: String,
    pub price: f64,
    pub available: bool,
    #[serde(default)]
    pub max_purchase_qty: u32,
    #[serde(default)]
    pub delivery_methods: Vec<u64>,
}
