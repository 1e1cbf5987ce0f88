//! Main API client implementation
//!
//! Every call to the backend goes through [`NutrilogClient::send`], the one
//! chokepoint that attaches the bearer token, rides out the
//! token-not-yet-persisted startup race, and recovers from an expired
//! access token with a single refresh-and-retry.

use crate::config::ClientConfig;
use crate::endpoints::{AuthApi, DietApi, IngredientApi};
use crate::error::{extract_error_message, ApiError, ApiResult};
use nutrilog_core::credentials::{CredentialStore, TOKEN_KEY};
use nutrilog_core::session::{clear_session, LogoutSink, NullLogoutSink};
use nutrilog_core::token::TokenInfo;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Outcome of the first request attempt
///
/// A 401 is not an error at this layer; it is a state transition into the
/// refresh protocol. Everything else is done, whatever its status.
enum Attempt {
    Done(Response),
    NeedsRefresh,
}

/// A fully specified request: method, headers, optional raw body
///
/// Closed by construction so header precedence stays unambiguous: the
/// caller's headers are applied first, `Content-Type: application/json` is
/// filled in only if absent, and `Authorization` is always injected by the
/// client, never by the caller.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// Caller-supplied headers
    pub headers: HeaderMap,
    /// Raw request body, if any
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    /// A bodyless GET request
    #[must_use]
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// A POST request with a JSON-serialized body
    pub fn post_json<B: Serialize>(body: &B) -> ApiResult<Self> {
        Ok(Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body: Some(serde_json::to_vec(body)?),
        })
    }

    /// Add a caller header
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Nutrilog API client with transparent token handling
///
/// The client owns the token lifecycle around a generic HTTP transport:
///
/// - waits (bounded, linear backoff) for a token the sign-in flow has not
///   persisted yet
/// - attaches `Authorization: Bearer <access_token>` to every call
/// - on a 401, refreshes the token once, persists the replacement, and
///   reissues the original request exactly once
/// - clears the stored session and notifies the [`LogoutSink`] when
///   recovery is impossible
///
/// Concurrent callers run the protocol independently; two calls that both
/// observe a 401 will both hit the refresh endpoint and both overwrite the
/// stored token (last writer wins). That duplicate-refresh race is an
/// accepted weakness of this layer, not a critical section.
#[derive(Clone)]
pub struct NutrilogClient {
    inner: Client,
    config: Arc<ClientConfig>,
    store: Arc<dyn CredentialStore>,
    logout_sink: Arc<dyn LogoutSink>,
}

impl NutrilogClient {
    /// Create a client with configuration from the environment
    pub fn new(store: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config, store)
    }

    /// Create a client with specific configuration
    pub fn with_config(config: ClientConfig, store: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        config.validate()?;

        let inner = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            store,
            logout_sink: Arc::new(NullLogoutSink),
        })
    }

    /// Install a logout sink, replacing the default no-op sink
    #[must_use]
    pub fn with_logout_sink(mut self, sink: Arc<dyn LogoutSink>) -> Self {
        self.logout_sink = sink;
        self
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// The credential store this client reads tokens from
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access authentication endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access diet-log endpoints
    #[must_use]
    pub fn diet(&self) -> DietApi {
        DietApi::new(self.clone())
    }

    /// Access ingredient-catalog endpoints
    #[must_use]
    pub fn ingredient(&self) -> IngredientApi {
        IngredientApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Authenticated request chokepoint
    // -------------------------------------------------------------------------

    /// Perform one authenticated request
    ///
    /// Returns the raw response for any non-401 status; checking `ok` and
    /// parsing an error body is the caller's contract. A 401 triggers at
    /// most one refresh and one reissue; the reissued response is returned
    /// regardless of its status, so a second 401 cannot recurse.
    pub async fn send(&self, endpoint: &str, options: RequestOptions) -> ApiResult<Response> {
        let request_id = Uuid::new_v4().to_string();

        let token = self.wait_for_token(&request_id).await?;

        match self
            .attempt(&request_id, endpoint, &options, &token.access_token)
            .await?
        {
            Attempt::Done(response) => Ok(response),
            Attempt::NeedsRefresh => {
                self.refresh_and_retry(&request_id, endpoint, &options, &token)
                    .await
            }
        }
    }

    /// Perform an authenticated request and deserialize a 2xx JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let response = self.send(endpoint, RequestOptions::get()).await?;
        Self::decode(response).await
    }

    /// POST a JSON body and deserialize a 2xx JSON response
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(endpoint, RequestOptions::post_json(body)?)
            .await?;
        Self::decode(response).await
    }

    /// POST a JSON body, expecting no meaningful response body
    pub async fn post_unit<B: Serialize>(&self, endpoint: &str, body: &B) -> ApiResult<()> {
        let response = self
            .send(endpoint, RequestOptions::post_json(body)?)
            .await?;
        Self::check(response).await.map(drop)
    }

    // -------------------------------------------------------------------------
    // Token lifecycle
    // -------------------------------------------------------------------------

    /// Wait for a usable token to appear in the credential store
    ///
    /// Bounded linear backoff: up to `max_retries` re-reads, a fixed delay
    /// apart. A blob that is missing, empty, or lacks an access token
    /// counts as absent.
    async fn wait_for_token(&self, request_id: &str) -> ApiResult<TokenInfo> {
        let wait = &self.config.token_wait;

        for attempt in 0..=wait.max_retries {
            let blob = self.store.get(TOKEN_KEY).await?;
            if let Some(token) = blob.as_deref().and_then(TokenInfo::from_blob) {
                if token.has_access_token() {
                    return Ok(token);
                }
            }

            if attempt < wait.max_retries {
                debug!(
                    request_id = %request_id,
                    attempt = attempt + 1,
                    max_retries = wait.max_retries,
                    delay_ms = wait.delay.as_millis(),
                    "token not found, retrying"
                );
                tokio::time::sleep(wait.delay).await;
            }
        }

        warn!(
            request_id = %request_id,
            retries = wait.max_retries,
            "no usable token after maximum retries"
        );
        Err(ApiError::AuthenticationRequired)
    }

    /// Refresh the access token using a refresh token
    ///
    /// Unauthenticated by definition; used internally by the 401 recovery
    /// path and exposed for sign-in flows that manage tokens themselves.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> ApiResult<TokenInfo> {
        let url = format!(
            "{}/auth/refresh_token",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .inner
            .post(&url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::api_response(
                status.as_u16(),
                extract_error_message(&body),
            ));
        }

        response.json().await.map_err(ApiError::Transport)
    }

    /// POST to an unauthenticated endpoint and deserialize a 2xx JSON body
    ///
    /// Only the sign-in endpoints bypass the bearer protocol; everything
    /// else goes through [`send`](Self::send).
    pub(crate) async fn post_json_public<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let response = self.inner.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    /// Clear the stored session and notify the logout sink
    ///
    /// Store failures here are logged and swallowed so they cannot mask the
    /// authentication error that is about to surface.
    pub async fn force_logout(&self) {
        if let Err(e) = clear_session(self.store.as_ref()).await {
            warn!(error = %e, "failed to clear session during logout");
        }
        self.logout_sink.on_logout().await;
    }

    // -------------------------------------------------------------------------
    // Request execution
    // -------------------------------------------------------------------------

    /// First attempt: a 401 becomes a refresh request, anything else is final
    async fn attempt(
        &self,
        request_id: &str,
        endpoint: &str,
        options: &RequestOptions,
        access_token: &str,
    ) -> ApiResult<Attempt> {
        let response = self
            .execute(request_id, endpoint, options, access_token)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(request_id = %request_id, endpoint = %endpoint, "received 401, token refresh needed");
            Ok(Attempt::NeedsRefresh)
        } else {
            Ok(Attempt::Done(response))
        }
    }

    /// The 401 recovery path: refresh once, reissue once
    async fn refresh_and_retry(
        &self,
        request_id: &str,
        endpoint: &str,
        options: &RequestOptions,
        token: &TokenInfo,
    ) -> ApiResult<Response> {
        if !token.has_refresh_token() {
            warn!(request_id = %request_id, "401 with no refresh token, logging out");
            self.force_logout().await;
            return Err(ApiError::RefreshUnavailable);
        }

        match self.refresh_access_token(&token.refresh_token).await {
            Ok(new_token) => {
                // Full replace of the stored token; never a partial update
                self.store.set(TOKEN_KEY, &new_token.to_blob()?).await?;
                debug!(request_id = %request_id, "token refreshed, reissuing original request");

                // Returned as-is even if it is another 401
                self.execute(request_id, endpoint, options, &new_token.access_token)
                    .await
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "token refresh failed, logging out");
                self.force_logout().await;
                Err(ApiError::RefreshFailed(Box::new(e)))
            }
        }
    }

    /// Issue one HTTP request with the bearer header attached
    async fn execute(
        &self,
        request_id: &str,
        endpoint: &str,
        options: &RequestOptions,
        access_token: &str,
    ) -> ApiResult<Response> {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        );
        let headers = build_headers(&options.headers, access_token)?;

        debug!(
            request_id = %request_id,
            method = %options.method,
            endpoint = %endpoint,
            "sending request"
        );

        let mut request = self
            .inner
            .request(options.method.clone(), &url)
            .headers(headers)
            .header(X_REQUEST_ID, request_id);

        if let Some(ref body) = options.body {
            request = request.body(body.clone());
        }

        request.send().await.map_err(ApiError::Transport)
    }

    /// Map a non-2xx response to `ApiError::ApiResponse`
    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::api_response(
                status.as_u16(),
                extract_error_message(&body),
            ))
        }
    }

    /// Check and deserialize a JSON response body
    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let response = Self::check(response).await?;
        response.json().await.map_err(ApiError::Transport)
    }
}

/// Merge caller headers with the mandatory request headers
///
/// Content-Type defaults to JSON but yields to a caller-set value;
/// Authorization always carries the current access token, even if the
/// caller tried to set it.
fn build_headers(caller: &HeaderMap, access_token: &str) -> ApiResult<HeaderMap> {
    let mut headers = caller.clone();

    headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/json"));

    let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
        .map_err(|_| ApiError::config("access token contains invalid header characters"))?;
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}
