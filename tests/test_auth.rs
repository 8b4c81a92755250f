//! Token manager integration tests against the scripted transport.

mod common;

use std::time::Duration;

use ticketsync_sdk::{config, ErrorKind, Method, SyncError};

// ---------------------------------------------------------------------------
// get_access_token
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_call_performs_password_grant() {
    let (sdk, transport, _clock) = common::setup();

    let token = sdk.tokens().get_access_token().await.unwrap();
    assert_eq!(token, "access-1");

    let requests = transport.token_requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["grant_type"], "password");
    assert_eq!(body["username"], "svc-user");
    assert_eq!(body["password"], "svc-pass");
    assert!(requests[0].bearer.is_none());
}

#[tokio::test]
async fn valid_token_is_reused_without_network() {
    let (sdk, transport, clock) = common::setup();

    sdk.tokens().get_access_token().await.unwrap();
    clock.advance_ms(30 * 60 * 1000);
    let again = sdk.tokens().get_access_token().await.unwrap();

    assert_eq!(again, "access-1");
    assert_eq!(transport.token_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_first_calls_share_one_grant() {
    let (sdk, transport, _clock) = common::setup();
    transport.delay(Method::Post, config::TOKEN_ENDPOINT, Duration::from_millis(200));

    let (first, second) = tokio::join!(
        sdk.tokens().get_access_token(),
        sdk.tokens().get_access_token(),
    );

    assert_eq!(first.unwrap(), "access-1");
    assert_eq!(second.unwrap(), "access-1");
    assert_eq!(transport.token_requests().len(), 1);
    assert_eq!(transport.max_in_flight(), 1);
}

#[tokio::test]
async fn token_with_61_seconds_left_is_valid() {
    let (sdk, transport, clock) = common::setup();
    transport.push_token_response(200, common::token_json("short", "r", 120).to_string());

    sdk.tokens().get_access_token().await.unwrap();
    clock.advance_ms(59 * 1000);

    assert_eq!(sdk.tokens().get_access_token().await.unwrap(), "short");
    assert_eq!(transport.token_requests().len(), 1);
}

#[tokio::test]
async fn token_with_59_seconds_left_is_expired() {
    let (sdk, transport, clock) = common::setup();
    transport.push_token_response(200, common::token_json("short", "r", 120).to_string());

    sdk.tokens().get_access_token().await.unwrap();
    clock.advance_ms(61 * 1000);

    assert_eq!(sdk.tokens().get_access_token().await.unwrap(), "access-1");
    assert_eq!(transport.grant_types(), vec!["password", "password"]);
}

#[tokio::test]
async fn unsuccessful_status_is_rejected() {
    let (sdk, transport, _clock) = common::setup();
    transport.push_token_response(
        200,
        r#"{"status":"error","access_token":"x","refresh_token":"y","expires_in":3600}"#,
    );

    let err = sdk.tokens().get_access_token().await.unwrap_err();
    assert!(matches!(err, SyncError::Authentication(ref m) if m == "Invalid response"));
    assert!(sdk.tokens().store().get().is_none());
}

#[tokio::test]
async fn non_2xx_grant_is_authentication_error() {
    let (sdk, transport, _clock) = common::setup();
    transport.push_token_response(401, r#"{"message":"bad credentials"}"#);

    let err = sdk.tokens().get_access_token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.to_string().contains("401"));
}

// ---------------------------------------------------------------------------
// refresh_access_token
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_uses_refresh_token_grant() {
    let (sdk, transport, _clock) = common::setup();

    sdk.tokens().get_access_token().await.unwrap();
    let refreshed = sdk.tokens().refresh_access_token().await.unwrap();

    assert_eq!(refreshed, "access-2");
    assert_eq!(transport.grant_types(), vec!["password", "refresh_token"]);
    let body = transport.token_requests()[1].body.clone().unwrap();
    assert_eq!(body["refresh_token"], "refresh-1");
}

#[tokio::test]
async fn failed_refresh_falls_back_to_password_grant() {
    let (sdk, transport, _clock) = common::setup();

    sdk.tokens().get_access_token().await.unwrap();
    transport.push_token_response(500, "upstream unavailable");
    let token = sdk.tokens().refresh_access_token().await.unwrap();

    assert_eq!(token, "access-2");
    assert_eq!(
        transport.grant_types(),
        vec!["password", "refresh_token", "password"]
    );
}

#[tokio::test]
async fn refresh_without_stored_token_uses_password_grant() {
    let (sdk, transport, _clock) = common::setup();

    let token = sdk.tokens().refresh_access_token().await.unwrap();
    assert_eq!(token, "access-1");
    assert_eq!(transport.grant_types(), vec!["password"]);
}

// ---------------------------------------------------------------------------
// Session scope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_forces_a_new_grant() {
    let (sdk, transport, _clock) = common::setup();

    sdk.tokens().get_access_token().await.unwrap();
    sdk.logout();
    assert!(sdk.tokens().store().get().is_none());

    assert_eq!(sdk.tokens().get_access_token().await.unwrap(), "access-2");
    assert_eq!(transport.token_requests().len(), 2);
}

#[tokio::test]
async fn tokens_never_reach_the_persistent_cache() {
    let (sdk, _transport, _clock) = common::setup();

    sdk.tokens().get_access_token().await.unwrap();
    assert!(sdk.cache().keys().unwrap().is_empty());
}

#[tokio::test]
async fn stored_token_expiry_is_relative_to_clock() {
    let (sdk, _transport, _clock) = common::setup();

    sdk.tokens().get_access_token().await.unwrap();
    let token = sdk.tokens().store().get().unwrap();
    assert_eq!(token.expires_at, common::NOW + 3600 * 1000);
    assert_eq!(token.refresh_token, "refresh-1");
}
