//! Reference data sync and lookup tests.

mod common;

use serde_json::json;
use ticketsync_sdk::config;
use ticketsync_sdk::{ApiResponse, Method};

const HOUR_MS: i64 = 60 * 60 * 1000;

fn reference_request_count(transport: &common::FakeTransport) -> usize {
    [
        config::TEAMS_ENDPOINT,
        config::VENUES_ENDPOINT,
        config::COMPETITIONS_ENDPOINT,
        config::COUNTRIES_ENDPOINT,
        config::TICKET_CATEGORIES_ENDPOINT,
        config::DELIVERY_METHODS_ENDPOINT,
    ]
    .iter()
    .map(|e| transport.requests_to(e).len())
    .sum()
}

// ---------------------------------------------------------------------------
// sync_all / get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_get_fetches_all_collections() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);

    let snapshot = sdk.reference().get().await.unwrap();

    assert_eq!(snapshot.teams.len(), 2);
    assert_eq!(snapshot.venues.len(), 1);
    assert_eq!(snapshot.competitions.len(), 1);
    assert_eq!(snapshot.countries.len(), 1);
    assert_eq!(snapshot.ticket_categories.len(), 2);
    assert_eq!(snapshot.delivery_methods.len(), 1);
    assert_eq!(snapshot.last_sync, Some(common::NOW));
    assert_eq!(reference_request_count(&transport), 6);
    assert!(!sdk.reference().needs_refresh().unwrap());
}

#[tokio::test]
async fn snapshot_younger_than_a_day_is_served_from_cache() {
    let (sdk, transport, clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();

    clock.advance_ms(23 * HOUR_MS);
    transport.reset_requests();
    let snapshot = sdk.reference().get().await.unwrap();

    assert_eq!(snapshot.last_sync, Some(common::NOW));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn snapshot_older_than_a_day_is_resynced() {
    let (sdk, transport, clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();

    clock.advance_ms(25 * HOUR_MS);
    assert!(sdk.reference().needs_refresh().unwrap());
    transport.reset_requests();
    let snapshot = sdk.reference().get().await.unwrap();

    assert_eq!(snapshot.last_sync, Some(common::NOW + 25 * HOUR_MS));
    assert_eq!(reference_request_count(&transport), 6);
}

#[tokio::test]
async fn sync_all_ignores_freshness() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();

    transport.reset_requests();
    sdk.reference().sync_all().await.unwrap();
    assert_eq!(reference_request_count(&transport), 6);
}

#[tokio::test]
async fn failed_sync_falls_back_to_cached_snapshot() {
    let (sdk, transport, clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();

    clock.advance_ms(25 * HOUR_MS);
    transport.on(Method::Get, config::COUNTRIES_ENDPOINT, |_| {
        Some(ApiResponse::new(500, "boom"))
    });
    let snapshot = sdk.reference().get().await.unwrap();

    assert_eq!(snapshot.last_sync, Some(common::NOW));
    assert_eq!(snapshot.teams.len(), 2);
}

#[tokio::test]
async fn failed_sync_without_cache_is_an_error() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    transport.on(Method::Get, config::VENUES_ENDPOINT, |_| {
        Some(ApiResponse::new(503, "maintenance"))
    });

    let err = sdk.reference().sync_all().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(sdk.reference().stored().unwrap().is_none());
}

#[tokio::test]
async fn paginated_collections_are_fully_crawled() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    common::serve_pages(
        &transport,
        config::TEAMS_ENDPOINT,
        vec![
            vec![json!({"id": 11, "name": "Arsenal"})],
            vec![json!({"id": 21, "name": "Chelsea"})],
            vec![json!({"id": 31, "name": "Everton"})],
        ],
    );

    let snapshot = sdk.reference().sync_all().await.unwrap();

    assert_eq!(snapshot.teams.len(), 3);
    assert_eq!(transport.requests_to(config::TEAMS_ENDPOINT).len(), 3);
}

// ---------------------------------------------------------------------------
// Single-entity fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_team_uses_snapshot_first() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();
    transport.reset_requests();

    let team = sdk.reference().get_team(11).await.unwrap();

    assert_eq!(team.name, "Arsenal");
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn get_team_miss_fetches_single_team() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();
    transport.push_json(
        Method::Get,
        "/teams/99",
        json!({"data": {"id": 99, "name": "Wrexham"}}),
    );

    let team = sdk.reference().get_team(99).await.unwrap();

    assert_eq!(team.name, "Wrexham");
    assert_eq!(transport.requests_to("/teams/99").len(), 1);
}

#[tokio::test]
async fn get_venue_miss_without_snapshot() {
    let (sdk, transport, _clock) = common::setup();
    transport.push_json(
        Method::Get,
        "/venues/5",
        json!({"data": {"id": 5, "name": "Anfield", "coordinates": {"lat": "53.43", "lng": "-2.96"}}}),
    );

    let venue = sdk.reference().get_venue(5).await.unwrap();

    assert_eq!(venue.name, "Anfield");
    assert_eq!(venue.coordinates.unwrap().lat, "53.43");
}

// ---------------------------------------------------------------------------
// ReferenceQuery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn name_lookups_read_cached_snapshot() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();

    let query = sdk.reference_query();
    assert_eq!(query.team_name(21).unwrap().as_deref(), Some("Chelsea"));
    assert_eq!(query.venue_name(101).unwrap().as_deref(), Some("Emirates Stadium"));
    assert_eq!(query.competition_name(1).unwrap().as_deref(), Some("Premier League"));
    assert_eq!(query.country_name(44).unwrap().as_deref(), Some("United Kingdom"));
    assert_eq!(query.country_by_code("gb").unwrap().as_deref(), Some("United Kingdom"));
    assert_eq!(query.ticket_category_name(2).unwrap().as_deref(), Some("Shortside Upper"));
    assert_eq!(query.delivery_method(1).unwrap().unwrap().name, "E-ticket");
    assert!(query.team_name(999).unwrap().is_none());

    let categories = query.ticket_categories_for_venue(101).unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].delivery_methods, vec![1]);
}

#[tokio::test]
async fn lookups_without_snapshot_are_empty() {
    let (sdk, _transport, _clock) = common::setup();

    let query = sdk.reference_query();
    assert!(query.snapshot().unwrap().is_none());
    assert!(query.team_name(11).unwrap().is_none());
    assert!(query.ticket_categories_for_venue(101).unwrap().is_empty());
}

#[tokio::test]
async fn clear_removes_snapshot() {
    let (sdk, transport, _clock) = common::setup();
    common::serve_reference(&transport);
    sdk.reference().get().await.unwrap();

    sdk.reference().clear().unwrap();
    assert!(sdk.reference().stored().unwrap().is_none());
    assert!(sdk.reference().needs_refresh().unwrap());
}
