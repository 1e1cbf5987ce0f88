//! Integration tests for the bearer/refresh protocol
//!
//! Every test runs the real client against a local mock server, asserting
//! call counts on the refresh endpoint and the exact bearer header carried
//! by each attempt.

use async_trait::async_trait;
use mockito::{Matcher, Server};
use nutrilog_api_client::{ApiError, ClientConfig, NutrilogClient, RequestOptions, TokenWaitConfig};
use nutrilog_core::credentials::{CredentialStore, MemoryCredentialStore, TOKEN_KEY, USER_INFO_KEY};
use nutrilog_core::session::LogoutSink;
use nutrilog_core::token::TokenInfo;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Logout sink that counts invocations
#[derive(Default)]
struct CountingSink {
    calls: AtomicUsize,
}

#[async_trait]
impl LogoutSink for CountingSink {
    async fn on_logout(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn token_blob(access: &str, refresh: &str) -> String {
    TokenInfo {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_in: "3600".to_string(),
        user: "u1".to_string(),
    }
    .to_blob()
    .unwrap()
}

async fn store_with_token(access: &str, refresh: &str) -> Arc<MemoryCredentialStore> {
    let store = Arc::new(MemoryCredentialStore::new());
    store.set(TOKEN_KEY, &token_blob(access, refresh)).await.unwrap();
    store
}

/// Client wired to the mock server with test-fast wait timings
fn client_for(server_url: &str, store: Arc<MemoryCredentialStore>) -> NutrilogClient {
    let config = ClientConfig::default()
        .with_base_url(server_url)
        .with_token_wait(TokenWaitConfig {
            max_retries: 3,
            delay: Duration::from_millis(10),
        });
    NutrilogClient::with_config(config, store).unwrap()
}

const DIET_LOG_BODY: &str = r#"{
    "log_date": "2026-08-25",
    "intake": 500.0,
    "consumption": 2000.0,
    "intake_foods": []
}"#;

#[tokio::test]
async fn bearer_header_matches_stored_token() {
    //* Given
    let mut server = Server::new_async().await;
    let diet_mock = server
        .mock("POST", "/diet/get_diet_log")
        .match_header("authorization", "Bearer A1")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({ "log_date": "2026-08-25" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DIET_LOG_BODY)
        .expect(1)
        .create_async()
        .await;

    let store = store_with_token("A1", "R1").await;
    let client = client_for(&server.url(), store);

    //* When
    let log = client.diet().log("2026-08-25").await.unwrap();

    //* Then
    diet_mock.assert_async().await;
    assert_eq!(log.intake, 500.0);
}

#[tokio::test]
async fn single_refresh_then_retry_with_new_token() {
    //* Given: first attempt 401s under A1, refresh mints A2, retry succeeds
    let mut server = Server::new_async().await;
    let stale_mock = server
        .mock("POST", "/diet/get_diet_log")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/auth/refresh_token")
        .match_body(Matcher::Json(serde_json::json!({ "refresh_token": "R1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"A2","refresh_token":"R2","expires_in":"3600","user":"u1"}"#)
        .expect(1)
        .create_async()
        .await;
    let fresh_mock = server
        .mock("POST", "/diet/get_diet_log")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DIET_LOG_BODY)
        .expect(1)
        .create_async()
        .await;

    let store = store_with_token("A1", "R1").await;
    let client = client_for(&server.url(), Arc::clone(&store));

    //* When
    let log = client.diet().log("2026-08-25").await.unwrap();

    //* Then
    stale_mock.assert_async().await;
    refresh_mock.assert_async().await;
    fresh_mock.assert_async().await;
    assert_eq!(log.log_date, "2026-08-25");

    // The whole token pair was replaced, byte-identical to the refresh response
    let stored = store.get(TOKEN_KEY).await.unwrap().unwrap();
    let token = TokenInfo::from_blob(&stored).unwrap();
    assert_eq!(token.access_token, "A2");
    assert_eq!(token.refresh_token, "R2");
}

#[tokio::test]
async fn second_401_is_returned_without_another_refresh() {
    //* Given: the retried request also 401s
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/diet/get_diet_log")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/auth/refresh_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"A2","refresh_token":"R2","expires_in":"3600","user":"u1"}"#)
        .expect(1)
        .create_async()
        .await;
    let still_stale_mock = server
        .mock("POST", "/diet/get_diet_log")
        .match_header("authorization", "Bearer A2")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let store = store_with_token("A1", "R1").await;
    let client = client_for(&server.url(), store);

    //* When: raw send, so the 401 response comes back to the caller
    let options = RequestOptions::post_json(&serde_json::json!({ "log_date": "2026-08-25" })).unwrap();
    let response = client.send("/diet/get_diet_log", options).await.unwrap();

    //* Then: exactly one refresh, no recursion into a second one
    assert_eq!(response.status().as_u16(), 401);
    refresh_mock.assert_async().await;
    still_stale_mock.assert_async().await;
}

#[tokio::test]
async fn missing_refresh_token_logs_out_without_network_refresh() {
    //* Given: a token with no refresh credential
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/diet/get_diet_log")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/auth/refresh_token")
        .expect(0)
        .create_async()
        .await;

    let store = store_with_token("A1", "").await;
    store.set(USER_INFO_KEY, r#"{"name":"Dana"}"#).await.unwrap();
    let sink = Arc::new(CountingSink::default());
    let client = client_for(&server.url(), Arc::clone(&store))
        .with_logout_sink(Arc::clone(&sink) as Arc<dyn LogoutSink>);

    //* When
    let err = client.diet().log("2026-08-25").await.unwrap_err();

    //* Then
    assert!(matches!(err, ApiError::RefreshUnavailable));
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    refresh_mock.assert_async().await;

    // Both session entries cleared together
    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(USER_INFO_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn refresh_failure_logs_out_and_never_writes_a_partial_token() {
    //* Given: the refresh endpoint itself is down
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/diet/get_diet_log")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/auth/refresh_token")
        .with_status(500)
        .with_body(r#"{"message":"refresh backend down"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = store_with_token("A1", "R1").await;
    let sink = Arc::new(CountingSink::default());
    let client = client_for(&server.url(), Arc::clone(&store))
        .with_logout_sink(Arc::clone(&sink) as Arc<dyn LogoutSink>);

    //* When
    let err = client.diet().log("2026-08-25").await.unwrap_err();

    //* Then: the refresh error propagates, wrapped
    match err {
        ApiError::RefreshFailed(source) => match *source {
            ApiError::ApiResponse { status, ref message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "refresh backend down");
            }
            other => panic!("unexpected refresh error source: {other}"),
        },
        other => panic!("expected RefreshFailed, got {other}"),
    }
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    refresh_mock.assert_async().await;

    // No replacement token was ever written; the session is cleared, not corrupted
    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn empty_store_fails_with_authentication_required_after_wait() {
    //* Given: nothing in the store and nothing ever arriving
    let mut server = Server::new_async().await;
    let diet_mock = server
        .mock("POST", "/diet/get_diet_log")
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&server.url(), store);

    //* When
    let start = std::time::Instant::now();
    let err = client.diet().log("2026-08-25").await.unwrap_err();

    //* Then: three waits happened before giving up, and no request was sent
    assert!(matches!(err, ApiError::AuthenticationRequired));
    assert!(start.elapsed() >= Duration::from_millis(30));
    diet_mock.assert_async().await;
}

#[tokio::test]
async fn token_appearing_mid_wait_unblocks_the_call() {
    //* Given: the sign-in flow persists a token while the call is waiting
    let mut server = Server::new_async().await;
    let diet_mock = server
        .mock("POST", "/diet/get_diet_log")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DIET_LOG_BODY)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let config = ClientConfig::default()
        .with_base_url(server.url())
        .with_token_wait(TokenWaitConfig {
            max_retries: 3,
            delay: Duration::from_millis(20),
        });
    let client =
        NutrilogClient::with_config(config, Arc::clone(&store) as Arc<dyn CredentialStore>)
            .unwrap();

    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            store.set(TOKEN_KEY, &token_blob("A1", "R1")).await.unwrap();
        })
    };

    //* When
    let log = client.diet().log("2026-08-25").await.unwrap();

    //* Then
    writer.await.unwrap();
    diet_mock.assert_async().await;
    assert_eq!(log.consumption, 2000.0);
}

#[tokio::test]
async fn non_ok_non_401_surfaces_as_api_response_with_body_message() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/ingredient/add")
        .with_status(422)
        .with_body(r#"{"message":"name already exists"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = store_with_token("A1", "R1").await;
    let client = client_for(&server.url(), store);

    //* When
    let ingredient = nutrilog_api_client::endpoints::ingredient::NewIngredient {
        unit_type: nutrilog_api_client::endpoints::ingredient::UnitType::Grams,
        brand: "Acme".to_string(),
        name: "Rolled Oats".to_string(),
        calories: 389.0,
        fat: 6.9,
        protein: 16.9,
        carbohydrates: 66.3,
        serving_size_grams: None,
        image_base64: None,
    };
    let err = client.ingredient().create(&ingredient).await.unwrap_err();

    //* Then: caller-side policy turned the response into a typed error
    match err {
        ApiError::ApiResponse { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "name already exists");
        }
        other => panic!("expected ApiResponse, got {other}"),
    }
}

#[tokio::test]
async fn sign_in_persists_session_from_numeric_wire_fields() {
    //* Given: the sign-in route sends user_id and expires_in as numbers
    let mut server = Server::new_async().await;
    let auth_mock = server
        .mock("POST", "/auth/mobile/google-auth")
        .match_body(Matcher::Json(serde_json::json!({
            "id_token": "g-id-token",
            "platform": "other",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "g-123",
                "user_id": 42,
                "name": "Dana",
                "email": "dana@example.com",
                "picture": null,
                "access_token": "A1",
                "refresh_token": "R1",
                "expires_in": 3600,
                "user": "u1"
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&server.url(), Arc::clone(&store));

    //* When
    let response = client
        .auth()
        .google_sign_in("g-id-token", nutrilog_api_client::endpoints::auth::Platform::Other)
        .await
        .unwrap();

    //* Then: both session entries were written, stringified
    auth_mock.assert_async().await;
    assert_eq!(response.user_id, 42);

    let token_blob = store.get(TOKEN_KEY).await.unwrap().unwrap();
    let token = TokenInfo::from_blob(&token_blob).unwrap();
    assert_eq!(token.access_token, "A1");
    assert_eq!(token.expires_in, "3600");

    let profile_blob = store.get(USER_INFO_KEY).await.unwrap().unwrap();
    assert!(profile_blob.contains("\"userId\":\"42\""));
}

#[tokio::test]
async fn get_endpoints_carry_the_bearer_too() {
    //* Given
    let mut server = Server::new_async().await;
    let calendar_mock = server
        .mock("GET", "/diet/date_has_intake_in_month?year=2026&month=8")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"dates":["2026-08-01","2026-08-25"]}"#)
        .expect(1)
        .create_async()
        .await;

    let store = store_with_token("A1", "R1").await;
    let client = client_for(&server.url(), store);

    //* When
    let month = client.diet().dates_with_intake(2026, 8).await.unwrap();

    //* Then
    calendar_mock.assert_async().await;
    assert_eq!(month.dates.len(), 2);
}
