/**
 * API Client
 *
 * Single chokepoint for every network call: base-path prefixing, JSON
 * content-typing, CSRF header injection for unsafe verbs, per-request
 * timeout, 401 interception, and typed-error translation. No other module
 * talks to the server directly.
 */

use crate::shared::config::AppConfig;
use crate::shared::error::ApiError;
use bytes::Bytes;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

/// Cookie the server uses to deliver the CSRF token
const CSRF_COOKIE: &str = "csrf_token";

/// Header the CSRF token is echoed back in on unsafe requests
const CSRF_HEADER: &str = "X-CSRF-Token";

type UnauthorizedHook = Box<dyn Fn() + Send + Sync>;

/// JSON error body convention: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// HTTP client with cookie-based auth and CSRF handling
pub struct ApiClient {
    http: Client,
    jar: Arc<Jar>,
    base: Url,
    timeout: Duration,
    on_unauthorized: Mutex<Option<UnauthorizedHook>>,
}

impl ApiClient {
    /// Create a client from the given configuration.
    ///
    /// The client owns a cookie jar shared across all requests; the session
    /// credential set by the server lives there and is sent automatically.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            jar,
            base: config.api_base.clone(),
            timeout: config.request_timeout,
            on_unauthorized: Mutex::new(None),
        })
    }

    /// Register the session-invalidated callback, replacing any previous one.
    ///
    /// Single slot: only the latest registration is active. The hook runs on
    /// the task that received the 401 and must not block.
    pub fn set_on_unauthorized(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook_slot() = Some(Box::new(hook));
    }

    /// Current CSRF token, read from the `csrf_token` cookie if the server
    /// has set one. Absence is not an error; it simply means no session has
    /// been established yet.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let raw = header.to_str().ok()?;
        parse_csrf_cookie(raw)
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.http.get(self.endpoint(path));
        let response = self.execute(Method::GET, builder).await?;
        Self::decode(response).await
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.http.post(self.endpoint(path)).json(body);
        let response = self.execute(Method::POST, builder).await?;
        Self::decode(response).await
    }

    /// POST with no body (guest creation, logout, OAuth exchange)
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.http.post(self.endpoint(path));
        let response = self.execute(Method::POST, builder).await?;
        Self::decode(response).await
    }

    /// POST form-encoded fields (OAuth2-style login)
    pub async fn post_form<T, F>(&self, path: &str, form: &F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let builder = self.http.post(self.endpoint(path)).form(form);
        let response = self.execute(Method::POST, builder).await?;
        Self::decode(response).await
    }

    /// POST a pre-serialized JSON body and return the raw response bytes.
    ///
    /// Used by the render endpoints, which reply with a PDF payload instead
    /// of JSON. The preview synchronizer passes its fingerprint string here
    /// verbatim, so the bytes on the wire are exactly the compared snapshot.
    pub async fn post_bytes(&self, path: &str, json_body: Option<String>) -> Result<Bytes, ApiError> {
        let mut builder = self.http.post(self.endpoint(path));
        if let Some(body) = json_body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = self.execute(Method::POST, builder).await?;
        response.bytes().await.map_err(Self::transport)
    }

    /// PUT a JSON body and decode a JSON response
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.http.put(self.endpoint(path)).json(body);
        let response = self.execute(Method::PUT, builder).await?;
        Self::decode(response).await
    }

    /// DELETE a resource; tolerates an empty or 204 response
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.http.delete(self.endpoint(path));
        let response = self.execute(Method::DELETE, builder).await?;
        Self::decode(response).await
    }

    /// Resolve a relative path against the API base
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// Apply the timeout and CSRF header, send, and translate the status.
    async fn execute(
        &self,
        method: Method,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response, ApiError> {
        let mut builder = builder.timeout(self.timeout);
        if method != Method::GET && method != Method::HEAD && method != Method::OPTIONS {
            if let Some(token) = self.csrf_token() {
                builder = builder.header(CSRF_HEADER, token);
            }
        }
        let response = builder.send().await.map_err(Self::transport)?;
        self.check_status(response).await
    }

    /// Translate non-2xx statuses into typed errors.
    async fn check_status(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("received 401, notifying session-invalidated hook");
            self.notify_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| body.detail);
            return Err(ApiError::http(status.as_u16(), detail));
        }
        Ok(response)
    }

    /// Decode a JSON body; 204 and empty bodies decode as JSON `null`, which
    /// covers `()` and `Option<T>` targets.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if response.status() == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(ApiError::from);
        }
        let bytes = response.bytes().await.map_err(Self::transport)?;
        if bytes.is_empty() {
            return serde_json::from_value(serde_json::Value::Null).map_err(ApiError::from);
        }
        serde_json::from_slice(&bytes).map_err(ApiError::from)
    }

    /// Normalize transport failures; abort-due-to-deadline becomes `Timeout`.
    fn transport(err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::network(err.to_string())
        }
    }

    fn notify_unauthorized(&self) {
        // The hook must not re-register itself reentrantly; it is called
        // while the slot lock is held.
        if let Some(hook) = self.hook_slot().as_ref() {
            hook();
        }
    }

    fn hook_slot(&self) -> MutexGuard<'_, Option<UnauthorizedHook>> {
        self.on_unauthorized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Pull the CSRF token out of a `Cookie` header value.
fn parse_csrf_cookie(raw: &str) -> Option<String> {
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
        .map(|value| value.trim_matches('"').to_string())
}
