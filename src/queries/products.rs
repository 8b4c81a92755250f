//! Product catalog queries over the cached collection.

use serde::Serialize;

use crate::cache::PersistentCache;
use crate::clock::Clock;
use crate::config::{self, keys};
use crate::error::{Result, SyncError};
use crate::models::{MatchStatus, Product};

/// Product type of football fixtures.
pub const FOOTBALL_MATCH: &str = "football_match";

// ---------------------------------------------------------------------------
// SearchProductsParams
// ---------------------------------------------------------------------------

/// Parameters for the catalog search.
///
/// All fields are optional. When `None`, the corresponding filter is skipped.
#[derive(Debug, Clone, Default)]
pub struct SearchProductsParams {
    /// Case-insensitive substring of the product name.
    pub text: Option<String>,
    pub product_type: Option<String>,
    pub venue: Option<u64>,
    pub competition: Option<u64>,
    /// Matches either the home or the away side.
    pub team: Option<u64>,
    pub status: Option<MatchStatus>,
    /// Epoch milliseconds, inclusive.
    pub starts_after: Option<i64>,
    /// Epoch milliseconds, inclusive.
    pub starts_before: Option<i64>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<usize>,
    /// Defaults to 100.
    pub page_size: Option<usize>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub last_page: usize,
}

// ---------------------------------------------------------------------------
// ProductQuery
// ---------------------------------------------------------------------------

pub struct ProductQuery<'a> {
    cache: &'a PersistentCache,
    clock: &'a dyn Clock,
}

impl<'a> ProductQuery<'a> {
    pub fn new(cache: &'a PersistentCache, clock: &'a dyn Clock) -> Self {
        Self { cache, clock }
    }

    /// Every cached product, in cache order.
    pub fn all(&self) -> Result<Vec<Product>> {
        Ok(self.cache.get(keys::PRODUCTS)?.unwrap_or_default())
    }

    pub fn get(&self, id: u64) -> Result<Option<Product>> {
        Ok(self.all()?.into_iter().find(|p| p.id == id))
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.all()?.len())
    }

    /// Upcoming football matches that have not started yet, soonest first.
    pub fn upcoming_matches(&self) -> Result<Vec<Product>> {
        let now = self.clock.now_ms();
        let mut matches: Vec<Product> = self
            .all()?
            .into_iter()
            .filter(|p| p.is_upcoming() && p.type_field == FOOTBALL_MATCH && p.starts_at_ms() >= now)
            .collect();
        sort_by_start(&mut matches);
        Ok(matches)
    }

    /// Filter, sort by start time and paginate the cached catalog.
    pub fn search(&self, params: &SearchProductsParams) -> Result<Page<Product>> {
        let page = params.page.unwrap_or(1);
        let page_size = params.page_size.unwrap_or(config::PAGE_SIZE as usize);
        if page == 0 || page_size == 0 {
            return Err(SyncError::InvalidArgument(
                "page and page_size must be at least 1".into(),
            ));
        }

        let needle = params.text.as_ref().map(|t| t.trim().to_lowercase());
        let mut matches: Vec<Product> = self
            .all()?
            .into_iter()
            .filter(|p| {
                needle
                    .as_ref()
                    .map_or(true, |n| p.name.to_lowercase().contains(n.as_str()))
            })
            .filter(|p| {
                params
                    .product_type
                    .as_ref()
                    .map_or(true, |t| &p.type_field == t)
            })
            .filter(|p| params.venue.map_or(true, |v| p.venue == Some(v)))
            .filter(|p| {
                params
                    .competition
                    .map_or(true, |c| p.match_info.competition == Some(c))
            })
            .filter(|p| params.team.map_or(true, |t| p.involves_team(t)))
            .filter(|p| params.status.map_or(true, |s| p.match_info.status == s))
            .filter(|p| params.starts_after.map_or(true, |t| p.starts_at_ms() >= t))
            .filter(|p| params.starts_before.map_or(true, |t| p.starts_at_ms() <= t))
            .collect();
        sort_by_start(&mut matches);

        let total = matches.len();
        let last_page = total.div_ceil(page_size).max(1);
        // An offset past usize::MAX is past the end of any page.
        let offset = (page - 1).checked_mul(page_size).unwrap_or(usize::MAX);
        let items = matches
            .into_iter()
            .skip(offset)
            .take(page_size)
            .collect();

        Ok(Page {
            items,
            page,
            page_size,
            total,
            last_page,
        })
    }
}

fn sort_by_start(products: &mut [Product]) {
    products.sort_by(|a, b| {
        a.match_info
            .start
            .epoch
            .cmp(&b.match_info.start.epoch)
            .then(a.id.cmp(&b.id))
    });
}
