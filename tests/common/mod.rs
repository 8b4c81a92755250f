//! Shared test fixtures for the ticketsync SDK integration tests.
//!
//! Provides a scripted [`FakeTransport`] standing in for the ticketing API,
//! JSON fixture builders, and `setup()` which wires an in-memory SDK to the
//! fake transport and a [`ManualClock`].

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use ticketsync_sdk::{
    config, ApiRequest, ApiResponse, HttpTransport, ManualClock, Method, TicketSyncSdk,
};

/// Fixed start time for every test clock (2023-11-14T22:13:20Z).
pub const NOW: i64 = 1_700_000_000_000;

pub const BASE_URL: &str = "https://api.test.local/v1";

type Handler = Box<dyn Fn(&ApiRequest) -> Option<ApiResponse> + Send + Sync>;

// ---------------------------------------------------------------------------
// FakeTransport
// ---------------------------------------------------------------------------

/// Scripted [`HttpTransport`].
///
/// - token requests are answered from a queue, or with a fresh
///   `access-N` token (one hour lifetime) once the queue is empty
/// - other requests are answered from a per-route queue; the last queued
///   response repeats, and an unscripted route answers 404
/// - a route handler, when registered, takes precedence over the queue
/// - a route delay makes requests to it suspend before answering; the
///   largest number of requests suspended at once is tracked
///
/// Every request is recorded.
#[derive(Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<ApiRequest>>,
    token_responses: Mutex<VecDeque<ApiResponse>>,
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    handlers: Mutex<HashMap<(Method, String), Handler>>,
    delays: Mutex<HashMap<(Method, String), Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    grants: Mutex<u32>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for `method endpoint`.
    pub fn push(&self, method: Method, endpoint: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, endpoint.to_string()))
            .or_default()
            .push_back(ApiResponse::new(status, body));
    }

    pub fn push_json(&self, method: Method, endpoint: &str, body: Value) {
        self.push(method, endpoint, 200, body.to_string());
    }

    /// Answer `method endpoint` by inspecting each request.
    pub fn on<F>(&self, method: Method, endpoint: &str, handler: F)
    where
        F: Fn(&ApiRequest) -> Option<ApiResponse> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert((method, endpoint.to_string()), Box::new(handler));
    }

    /// Suspend every request to `method endpoint` for `delay`.
    pub fn delay(&self, method: Method, endpoint: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert((method, endpoint.to_string()), delay);
    }

    /// Most delayed requests that were suspended at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Queue a response for the next token request.
    pub fn push_token_response(&self, status: u16, body: impl Into<String>) {
        self.token_responses
            .lock()
            .unwrap()
            .push_back(ApiResponse::new(status, body));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.endpoint == endpoint)
            .collect()
    }

    pub fn token_requests(&self) -> Vec<ApiRequest> {
        self.requests_to(config::TOKEN_ENDPOINT)
    }

    /// `grant_type` of each token request, in order.
    pub fn grant_types(&self) -> Vec<String> {
        self.token_requests()
            .iter()
            .filter_map(|r| r.body.as_ref())
            .filter_map(|b| b["grant_type"].as_str().map(str::to_string))
            .collect()
    }

    pub fn reset_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn next_token(&self) -> ApiResponse {
        if let Some(resp) = self.token_responses.lock().unwrap().pop_front() {
            return resp;
        }
        let mut grants = self.grants.lock().unwrap();
        *grants += 1;
        let n = *grants;
        ApiResponse::new(
            200,
            token_json(&format!("access-{}", n), &format!("refresh-{}", n), 3600).to_string(),
        )
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> ticketsync_sdk::Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let key = (request.method, request.endpoint.clone());
        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        if request.endpoint == config::TOKEN_ENDPOINT {
            return Ok(self.next_token());
        }

        if let Some(handler) = self.handlers.lock().unwrap().get(&key) {
            if let Some(resp) = handler(&request) {
                return Ok(resp);
            }
        }

        let mut routes = self.routes.lock().unwrap();
        let resp = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(resp.unwrap_or_else(|| ApiResponse::new(404, r#"{"message":"Not Found"}"#)))
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// An SDK with an in-memory cache, the fake transport and a manual clock
/// starting at [`NOW`].
pub fn setup() -> (TicketSyncSdk, Arc<FakeTransport>, Arc<ManualClock>) {
    let transport = FakeTransport::new();
    let clock = Arc::new(ManualClock::new(NOW));
    let sdk = TicketSyncSdk::builder()
        .base_url(BASE_URL)
        .credentials("svc-user", "svc-pass")
        .in_memory(true)
        .transport(transport.clone())
        .clock(clock.clone())
        .build()
        .unwrap();
    (sdk, transport, clock)
}

/// Like [`setup`], but with the cache persisted under `dir`.
pub fn setup_in_dir(
    dir: &Path,
    transport: Arc<FakeTransport>,
    clock: Arc<ManualClock>,
) -> TicketSyncSdk {
    TicketSyncSdk::builder()
        .base_url(BASE_URL)
        .credentials("svc-user", "svc-pass")
        .cache_dir(dir)
        .transport(transport)
        .clock(clock)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// JSON fixtures
// ---------------------------------------------------------------------------

pub fn token_json(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({
        "status": "success",
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "Bearer",
        "expires_in": expires_in,
    })
}

/// A football match starting at `epoch` (Unix seconds).
pub fn product_json(id: u64, name: &str, status: &str, epoch: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "football_match",
        "slug": name.to_lowercase().replace(' ', "-"),
        "match": {
            "start": {
                "tz": "Europe/London",
                "local": "2024-01-01 15:00:00",
                "utc": "2024-01-01 15:00:00",
                "epoch": epoch,
            },
            "time_confirmed": "confirmed",
            "home": 10 + id,
            "away": 20 + id,
            "competition": 1,
            "status": status,
        },
        "venue": 100 + id,
        "event_dates": [],
        "images": { "main": null, "thumb": null },
    })
}

/// A match `hours` from [`NOW`].
pub fn upcoming_product(id: u64, name: &str, hours: i64) -> Value {
    product_json(id, name, "Upcoming", NOW / 1000 + hours * 3600)
}

pub fn paginated(items: Vec<Value>, current_page: u32, last_page: u32) -> Value {
    json!({
        "data": items,
        "links": { "first": null, "last": null, "prev": null, "next": null },
        "meta": {
            "current_page": current_page,
            "last_page": last_page,
            "per_page": 100,
        },
    })
}

/// Inventory for one product with `(price, available)` ticket options.
pub fn inventory_json(id: u64, options: &[(f64, bool)]) -> Value {
    let ticket_options: Vec<Value> = options
        .iter()
        .enumerate()
        .map(|(i, (price, available))| {
            json!({
                "id": id * 100 + i as u64,
                "ticket_category": 1,
                "name": format!("Category {}", i + 1),
                "price": price,
                "available": available,
                "max_purchase_qty": 4,
                "delivery_methods": [1],
            })
        })
        .collect();
    json!({ "id": id, "status": "Upcoming", "ticket_options": ticket_options })
}

/// Value of query parameter `key` on a recorded request.
pub fn query_value(request: &ApiRequest, key: &str) -> Option<String> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

pub fn page_number(request: &ApiRequest) -> u32 {
    query_value(request, "page[number]")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

/// Serve `pages` of `endpoint` by `page[number]`.
pub fn serve_pages(transport: &FakeTransport, endpoint: &str, pages: Vec<Vec<Value>>) {
    let last = pages.len().max(1) as u32;
    transport.on(Method::Get, endpoint, move |req| {
        let page = page_number(req);
        let items = pages.get(page as usize - 1).cloned().unwrap_or_default();
        Some(ApiResponse::new(200, paginated(items, page, last).to_string()))
    });
}

/// Serve every reference endpoint with a small fixed snapshot.
pub fn serve_reference(transport: &FakeTransport) {
    serve_pages(
        transport,
        config::TEAMS_ENDPOINT,
        vec![vec![
            json!({"id": 11, "name": "Arsenal"}),
            json!({"id": 21, "name": "Chelsea"}),
        ]],
    );
    serve_pages(
        transport,
        config::VENUES_ENDPOINT,
        vec![vec![json!({"id": 101, "name": "Emirates Stadium", "city": "London"})]],
    );
    serve_pages(
        transport,
        config::TICKET_CATEGORIES_ENDPOINT,
        vec![vec![
            json!({"id": 1, "name": "Longside Lower", "venue": 101, "delivery_methods": [1]}),
            json!({"id": 2, "name": "Shortside Upper", "venue": 202}),
        ]],
    );
    serve_pages(
        transport,
        config::DELIVERY_METHODS_ENDPOINT,
        vec![vec![json!({"id": 1, "name": "E-ticket", "requires_delivery": false})]],
    );
    transport.push_json(
        Method::Get,
        config::COMPETITIONS_ENDPOINT,
        json!({"data": [{"id": 1, "name": "Premier League"}]}),
    );
    transport.push_json(
        Method::Get,
        config::COUNTRIES_ENDPOINT,
        json!({"data": [{"id": 44, "code": "GB", "name": "United Kingdom"}]}),
    );
}
