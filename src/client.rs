//! Authenticated JSON client for the ticketing API.
//!
//! Every call resolves a bearer token through the [`TokenManager`]. A 401 from
//! any endpoint except the token endpoint triggers exactly one refresh and one
//! retry; nothing else is retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::TokenManager;
use crate::config;
use crate::error::{Result, SyncError};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method};

// ---------------------------------------------------------------------------
// QueryParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum ParamValue {
    Scalar(String),
    List(Vec<String>),
    Page { number: u32, size: u32 },
}

/// Ordered query parameters with the API's encoding conventions.
///
/// - scalars encode as `key=value`
/// - lists encode as repeated keys (`venue=1&venue=2`)
/// - pagination encodes as `page[number]=N&page[size]=S`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar parameter. Replaces any earlier value for `key`.
    pub fn insert(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.put(key, ParamValue::Scalar(value.to_string()))
    }

    /// Set an array-valued parameter.
    pub fn insert_all<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.put(key, ParamValue::List(values))
    }

    /// Set the pagination structure.
    pub fn page(&mut self, number: u32, size: u32) -> &mut Self {
        self.put("page", ParamValue::Page { number, size })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into `(key, value)` pairs in insertion order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.entries {
            match value {
                ParamValue::Scalar(v) => pairs.push((key.clone(), v.clone())),
                ParamValue::List(values) => {
                    for v in values {
                        pairs.push((key.clone(), v.clone()));
                    }
                }
                ParamValue::Page { number, size } => {
                    pairs.push((format!("{}[number]", key), number.to_string()));
                    pairs.push((format!("{}[size]", key), size.to_string()));
                }
            }
        }
        pairs
    }

    fn put(&mut self, key: &str, value: ParamValue) -> &mut Self {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// HTTP client for the ticketing API.
///
/// This is the one layer that propagates request failures; the sync
/// orchestrators above it turn those failures into result records.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenManager>,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn HttpTransport>, tokens: Arc<TokenManager>) -> Self {
        Self {
            transport,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &QueryParams) -> Result<T> {
        self.request(Method::Get, endpoint, None, params).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::Post, endpoint, Some(body), &QueryParams::new())
            .await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::Put, endpoint, Some(body), &QueryParams::new())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::Delete, endpoint, None, &QueryParams::new())
            .await
    }

    /// Issue a request and decode the JSON response.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
        params: &QueryParams,
    ) -> Result<T> {
        let query = params.to_pairs();
        let token = self.tokens.get_access_token().await?;
        let mut resp = self
            .send(method, endpoint, &query, body.clone(), token)
            .await?;

        if resp.status == 401 && !endpoint.starts_with(config::TOKEN_ENDPOINT) {
            tracing::info!(endpoint, "token rejected; refreshing and retrying once");
            let token = self.tokens.refresh_access_token().await?;
            resp = self.send(method, endpoint, &query, body, token).await?;
            if resp.status == 401 {
                return Err(SyncError::Authentication(format!(
                    "{} {} rejected after token refresh",
                    method.as_str(),
                    endpoint
                )));
            }
        }

        decode(endpoint, resp)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
        token: String,
    ) -> Result<ApiResponse> {
        let request = ApiRequest {
            method,
            endpoint: endpoint.to_string(),
            url: format!("{}{}", self.base_url, endpoint),
            bearer: Some(token),
            query: query.to_vec(),
            body,
        };
        tracing::trace!(method = method.as_str(), endpoint, "sending request");
        self.transport.send(request).await
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, resp: ApiResponse) -> Result<T> {
    if resp.status == 429 {
        tracing::warn!(endpoint, "rate limited");
        return Err(SyncError::RateLimited);
    }
    if !resp.is_success() {
        tracing::warn!(endpoint, status = resp.status, "request failed");
        return Err(SyncError::http(resp.status, resp.body));
    }
    Ok(serde_json::from_str(&resp.body)?)
}
