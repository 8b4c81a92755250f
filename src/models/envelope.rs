use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DataEnvelope - `{ "data": ... }` wrapper used by single-resource endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

// ---------------------------------------------------------------------------
// Paginated - List endpoints returning `data` plus pagination `meta`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub links: Option<PaginationLinks>,
    /// Absent on endpoints that return everything in one page.
    #[serde(default)]
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn has_more(&self) -> bool {
        self.meta.current_page < self.meta.last_page
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for PaginationMeta {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            from: None,
            to: None,
            per_page: None,
            total: None,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationLinks {
    pub first: Option<String>,
    pub last: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
}
