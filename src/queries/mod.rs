//! Cache-backed read interface for the UI.
//!
//! Each module provides a query struct that borrows the
//! [`PersistentCache`](crate::cache::PersistentCache) and never touches the
//! network.

pub mod inventory;
pub mod products;
pub mod reference;

pub use inventory::InventoryQuery;
pub use products::{Page, ProductQuery, SearchProductsParams};
pub use reference::ReferenceQuery;
