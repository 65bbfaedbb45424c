//! ==============================================================================
//! client.rs - session-aware backend client
//! ==============================================================================
//!
//! purpose:
//!     single point of contact with the sensor-hub backend. owns the
//!     connection configuration (base url), the in-memory bearer token,
//!     and the unauthorized callback. every operation funnels through one
//!     dispatch path so the cross-cutting behavior lives in exactly one
//!     place:
//!     - outbound: attach `Authorization: Bearer <token>` iff a token is set
//!     - inbound:  on any 401, clear the token and fire the callback once,
//!       then hand the classified error back to the caller
//!
//! relationships:
//!     - produces: domain.rs wire types
//!     - raises: error.rs ApiError (classified by status)
//!     - token/url persistence across restarts: config.rs, which calls the
//!       plain getters/setters here - the client never touches disk
//!
//! ==============================================================================

use std::sync::{Arc, RwLock};

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{AuthToken, SensorReading, SensorReadingCreate};
use crate::error::{extract_message, ApiError};

/// used when no URL has ever been configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Session state shared by all clones of one [`SessionClient`].
///
/// Guards are held only for short field copies, never across an await;
/// concurrent in-flight operations stay independent and unserialized.
struct SessionState {
    /// normalized base url, e.g. "http://host:8080/api"
    base_url: String,
    /// base url with a trailing "/api" stripped; derived once per set_base_url
    root_url: String,
    /// current bearer token, absent until login/register or a restored value
    token: Option<String>,
}

struct Inner {
    http: reqwest::Client,
    state: RwLock<SessionState>,
    /// fired exactly once per detected 401, before the error propagates
    on_unauthorized: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Typed client for the sensor-hub readings API.
///
/// Explicitly constructed and passed around (no process-wide singleton);
/// cheap to clone, all clones share one session. Operations are one-shot
/// request/response exchanges with no retries, timeouts beyond transport
/// defaults, or cancellation - a failed call surfaces immediately and the
/// caller decides whether to retry.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

/// Builder so the unauthorized callback is wired at construction instead
/// of through a mutable late-bound field.
#[derive(Default)]
pub struct SessionClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    on_unauthorized: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SessionClientBuilder {
    /// Initial base URL (normalized the same way as `set_base_url`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Restore a previously persisted bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Callback invoked once per 401 detected on any operation. Side-channel
    /// notification only - the triggering call still fails with
    /// [`ApiError::AuthenticationFailed`].
    pub fn on_unauthorized(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> SessionClient {
        let base = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));
        let root = derive_root_url(&base);
        SessionClient {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                state: RwLock::new(SessionState {
                    base_url: base,
                    root_url: root,
                    token: self.token,
                }),
                on_unauthorized: self.on_unauthorized,
            }),
        }
    }
}

/// trim whitespace and a single trailing slash
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// strip one trailing "/api" segment, if present
fn derive_root_url(base_url: &str) -> String {
    base_url
        .strip_suffix("/api")
        .unwrap_or(base_url)
        .to_string()
}

impl Default for SessionClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionClient {
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    // ==========================================================================
    // session state
    // ==========================================================================

    /// Point the session at a different backend. The caller supplies a
    /// syntactically valid http(s) URL; beyond trimming, nothing is
    /// validated here.
    pub fn set_base_url(&self, url: &str) {
        let base = normalize_base_url(url);
        let root = derive_root_url(&base);
        let mut state = self.inner.state.write().unwrap();
        state.base_url = base;
        state.root_url = root;
    }

    /// Last normalized base URL set (or [`DEFAULT_BASE_URL`]).
    pub fn base_url(&self) -> String {
        self.inner.state.read().unwrap().base_url.clone()
    }

    pub fn set_token(&self, token: &str) {
        self.inner.state.write().unwrap().token = Some(token.to_string());
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.read().unwrap().token.clone()
    }

    pub fn clear_token(&self) {
        self.inner.state.write().unwrap().token = None;
    }

    /// resource endpoint: root + "/api" + path
    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.inner.state.read().unwrap().root_url, path)
    }

    /// auth endpoint: root + "/auth" + path
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth{}", self.inner.state.read().unwrap().root_url, path)
    }

    // ==========================================================================
    // dispatch path - every request goes through here
    // ==========================================================================

    async fn dispatch(&self, method: Method, url: String) -> Result<Response, ApiError> {
        self.send(self.inner.http.request(method, &url), &url).await
    }

    async fn dispatch_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.send(self.inner.http.request(method, &url).json(body), &url)
            .await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, ApiError> {
        // attach the bearer credential iff a token is set; never send a
        // stale or empty header
        let request = match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        debug!(%url, "dispatching request");

        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "no response from backend");
            ApiError::NetworkUnreachable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = extract_message(&response.text().await.unwrap_or_default());

        if status == StatusCode::UNAUTHORIZED {
            // response-wide interceptor semantics: whichever operation
            // triggered this, drop the session and notify the application
            warn!(%url, "401 from backend, clearing session token");
            self.clear_token();
            if let Some(handler) = &self.inner.on_unauthorized {
                handler();
            }
            return Err(ApiError::AuthenticationFailed(message));
        }

        Err(match status {
            StatusCode::CONFLICT => ApiError::Conflict(message),
            StatusCode::BAD_REQUEST => ApiError::InvalidInput(message),
            other => ApiError::ServerError {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ==========================================================================
    // authentication
    // ==========================================================================

    /// POST /auth/login. The token is returned, not stored - callers decide
    /// whether to adopt it via [`set_token`](Self::set_token).
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let response = self
            .dispatch_json(
                Method::POST,
                self.auth_url("/login"),
                &Credentials { username, password },
            )
            .await?;
        Self::decode(response).await
    }

    /// POST /auth/register. 409 means the username is already taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let response = self
            .dispatch_json(
                Method::POST,
                self.auth_url("/register"),
                &Credentials { username, password },
            )
            .await?;
        Self::decode(response).await
    }

    // ==========================================================================
    // readings
    // ==========================================================================

    /// GET /api/readings - all readings, in server order.
    pub async fn get_readings(&self) -> Result<Vec<SensorReading>, ApiError> {
        let response = self.dispatch(Method::GET, self.api_url("/readings")).await?;
        Self::decode(response).await
    }

    /// GET /api/readings/{sensorId} - one sensor's stream.
    pub async fn get_readings_by_sensor(
        &self,
        sensor_id: &str,
    ) -> Result<Vec<SensorReading>, ApiError> {
        let url = self.api_url(&format!("/readings/{}", sensor_id));
        let response = self.dispatch(Method::GET, url).await?;
        Self::decode(response).await
    }

    /// POST /api/readings - returns the created reading with server-assigned
    /// id and timestamp.
    pub async fn create_reading(
        &self,
        reading: &SensorReadingCreate,
    ) -> Result<SensorReading, ApiError> {
        let response = self
            .dispatch_json(Method::POST, self.api_url("/readings"), reading)
            .await?;
        Self::decode(response).await
    }

    /// Lightweight reachability probe against the readings endpoint.
    /// Never errors: anything short of a success status collapses to false.
    pub async fn test_connection(&self) -> bool {
        self.dispatch(Method::GET, self.api_url("/readings"))
            .await
            .is_ok()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}
