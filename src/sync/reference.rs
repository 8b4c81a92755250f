//! Slow-changing reference collections, refreshed once a day.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::QueryParams;
use crate::config::{self, keys};
use crate::error::Result;
use crate::models::{
    Competition, Country, DataEnvelope, DeliveryMethod, StaticData, Team, TicketCategory, Venue,
};

use super::{fetch_all_pages, SyncContext};

/// Keeps the [`StaticData`] snapshot in the cache fresh.
#[derive(Clone)]
pub struct ReferenceSync {
    ctx: SyncContext,
    in_flight: Arc<Mutex<()>>,
}

impl ReferenceSync {
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            ctx,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Return the cached snapshot if it is younger than 24 hours, otherwise
    /// run a full [`sync_all`](Self::sync_all).
    pub async fn get(&self) -> Result<StaticData> {
        let _guard = self.in_flight.lock().await;
        if let Some(stored) = self.stored()? {
            if self.is_fresh(&stored) {
                return Ok(stored);
            }
        }
        self.sync_all_locked().await
    }

    /// Fetch all six collections and replace the cached snapshot.
    ///
    /// Any failing collection aborts the whole sync. The last cached snapshot
    /// is returned in that case; the error only propagates if there is none.
    pub async fn sync_all(&self) -> Result<StaticData> {
        let _guard = self.in_flight.lock().await;
        self.sync_all_locked().await
    }

    async fn sync_all_locked(&self) -> Result<StaticData> {
        tracing::info!("syncing static data");
        match self.fetch_and_store().await {
            Ok(snapshot) => {
                tracing::info!(
                    teams = snapshot.teams.len(),
                    venues = snapshot.venues.len(),
                    competitions = snapshot.competitions.len(),
                    countries = snapshot.countries.len(),
                    ticket_categories = snapshot.ticket_categories.len(),
                    delivery_methods = snapshot.delivery_methods.len(),
                    "static data synced"
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "static data sync failed");
                match self.stored() {
                    Ok(Some(cached)) => {
                        tracing::info!("using cached static data");
                        Ok(cached)
                    }
                    _ => Err(e),
                }
            }
        }
    }

    async fn fetch_and_store(&self) -> Result<StaticData> {
        let client = &self.ctx.client;
        let none = QueryParams::new();

        let (teams, venues, ticket_categories, delivery_methods, competitions, countries) = tokio::try_join!(
            fetch_all_pages::<Team>(client, config::TEAMS_ENDPOINT, QueryParams::new()),
            fetch_all_pages::<Venue>(client, config::VENUES_ENDPOINT, QueryParams::new()),
            fetch_all_pages::<TicketCategory>(
                client,
                config::TICKET_CATEGORIES_ENDPOINT,
                QueryParams::new()
            ),
            fetch_all_pages::<DeliveryMethod>(
                client,
                config::DELIVERY_METHODS_ENDPOINT,
                QueryParams::new()
            ),
            client.get::<DataEnvelope<Vec<Competition>>>(config::COMPETITIONS_ENDPOINT, &none),
            client.get::<DataEnvelope<Vec<Country>>>(config::COUNTRIES_ENDPOINT, &none),
        )?;

        let snapshot = StaticData {
            teams,
            venues,
            competitions: competitions.data,
            countries: countries.data,
            ticket_categories,
            delivery_methods,
            last_sync: Some(self.ctx.now_ms()),
        };
        self.ctx.cache.set(keys::STATIC_DATA, &snapshot)?;
        Ok(snapshot)
    }

    /// Look up a team in the snapshot, fetching just that team on a miss.
    pub async fn get_team(&self, id: u64) -> Result<Team> {
        if let Some(team) = self.stored()?.as_ref().and_then(|s| s.team(id)) {
            return Ok(team.clone());
        }
        self.fetch_one(config::TEAMS_ENDPOINT, id).await
    }

    /// Look up a venue in the snapshot, fetching just that venue on a miss.
    pub async fn get_venue(&self, id: u64) -> Result<Venue> {
        if let Some(venue) = self.stored()?.as_ref().and_then(|s| s.venue(id)) {
            return Ok(venue.clone());
        }
        self.fetch_one(config::VENUES_ENDPOINT, id).await
    }

    /// Look up a competition in the snapshot, fetching just that one on a miss.
    pub async fn get_competition(&self, id: u64) -> Result<Competition> {
        if let Some(competition) = self.stored()?.as_ref().and_then(|s| s.competition(id)) {
            return Ok(competition.clone());
        }
        self.fetch_one(config::COMPETITIONS_ENDPOINT, id).await
    }

    async fn fetch_one<T: serde::de::DeserializeOwned>(&self, endpoint: &str, id: u64) -> Result<T> {
        let endpoint = format!("{}/{}", endpoint, id);
        let response: DataEnvelope<T> = self.ctx.client.get(&endpoint, &QueryParams::new()).await?;
        Ok(response.data)
    }

    pub fn stored(&self) -> Result<Option<StaticData>> {
        self.ctx.cache.get(keys::STATIC_DATA)
    }

    /// True when there is no snapshot or it is at least 24 hours old.
    pub fn needs_refresh(&self) -> Result<bool> {
        Ok(!self.stored()?.is_some_and(|s| self.is_fresh(&s)))
    }

    fn is_fresh(&self, snapshot: &StaticData) -> bool {
        snapshot
            .last_sync
            .is_some_and(|at| self.ctx.now_ms() - at < config::STATIC_DATA_MAX_AGE_MS)
    }

    pub fn clear(&self) -> Result<()> {
        self.ctx.cache.remove(keys::STATIC_DATA)?;
        tracing::info!("cleared static data");
        Ok(())
    }
}
