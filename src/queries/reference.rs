//! Name lookups against the cached reference snapshot.

use crate::cache::PersistentCache;
use crate::config::keys;
use crate::error::Result;
use crate::models::{DeliveryMethod, StaticData, TicketCategory};

pub struct ReferenceQuery<'a> {
    cache: &'a PersistentCache,
}

impl<'a> ReferenceQuery<'a> {
    pub fn new(cache: &'a PersistentCache) -> Self {
        Self { cache }
    }

    pub fn snapshot(&self) -> Result<Option<StaticData>> {
        self.cache.get(keys::STATIC_DATA)
    }

    fn lookup<T>(&self, f: impl FnOnce(&StaticData) -> Option<T>) -> Result<Option<T>> {
        Ok(self.snapshot()?.as_ref().and_then(f))
    }

    pub fn team_name(&self, id: u64) -> Result<Option<String>> {
        self.lookup(|s| s.team(id).map(|t| t.name.clone()))
    }

    pub fn venue_name(&self, id: u64) -> Result<Option<String>> {
        self.lookup(|s| s.venue(id).map(|v| v.name.clone()))
    }

    pub fn competition_name(&self, id: u64) -> Result<Option<String>> {
        self.lookup(|s| s.competition(id).map(|c| c.name.clone()))
    }

    pub fn country_name(&self, id: u64) -> Result<Option<String>> {
        self.lookup(|s| s.country(id).map(|c| c.name.clone()))
    }

    /// Country name by ISO code, case-insensitive.
    pub fn country_by_code(&self, code: &str) -> Result<Option<String>> {
        self.lookup(|s| {
            s.countries
                .iter()
                .find(|c| c.code.eq_ignore_ascii_case(code))
                .map(|c| c.name.clone())
        })
    }

    pub fn ticket_category_name(&self, id: u64) -> Result<Option<String>> {
        self.lookup(|s| s.ticket_category(id).map(|c| c.name.clone()))
    }

    pub fn ticket_categories_for_venue(&self, venue_id: u64) -> Result<Vec<TicketCategory>> {
        Ok(self
            .lookup(|s| {
                Some(
                    s.ticket_categories
                        .iter()
                        .filter(|c| c.venue == Some(venue_id))
                        .cloned()
                        .collect::<Vec<_>>(),
                )
            })?
            .unwrap_or_default())
    }

    pub fn delivery_method(&self, id: u64) -> Result<Option<DeliveryMethod>> {
        self.lookup(|s| s.delivery_method(id).cloned())
    }
}
