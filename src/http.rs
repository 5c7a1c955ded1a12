//! HTTP client wrapper: bearer injection and 401 interception.
//!
//! ARCHITECTURE
//! ============
//! One `reqwest::Client` per `HttpClient`, shared by every call. `send` is the
//! only path for authenticated traffic:
//!
//! 1. Read the current token and generation from the session store.
//! 2. Attach `Authorization: Bearer <token>` when a token exists.
//! 3. On 401 from anything but the login endpoint, expire the session for
//!    the generation the request was issued under.
//! 4. Surface every non-2xx status to the caller as an `ApiError`.
//!
//! The login exchange goes through `request` directly so it never carries a
//! stale bearer and never triggers the 401 path.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::session::{BearerGrant, SessionStore};

pub const LOGIN_PATH: &str = "/session";

// =============================================================================
// REQUEST SHAPE
// =============================================================================

/// Payload of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

impl RequestBody {
    /// Serialize any value into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

/// Per-call overrides passed through to the request.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    default_timeout: Option<Duration>,
    session: SessionStore,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.clone(), default_timeout: config.request_timeout, session })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Undecorated request builder: no bearer, no interception. Carries the
    /// default request timeout when one is configured.
    pub(crate) fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.default_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Send an authenticated request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] on 401, [`ApiError::Status`] on any
    /// other non-2xx status, and a transport error when no response arrived.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4();
        let grant = self.session.bearer();

        let mut builder = self.request(method.clone(), path);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder.json(&json),
            RequestBody::Multipart(form) => builder.multipart(form),
        };
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        let mut headers = options.headers;
        // The session owns Authorization.
        if headers.remove(AUTHORIZATION).is_some() {
            tracing::debug!(%request_id, path, "dropping caller-supplied authorization header");
        }
        if !headers.is_empty() {
            builder = builder.headers(headers);
        }
        builder = authorize(builder, grant.as_ref());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(%request_id, %method, path, authenticated = grant.is_some(), "sending request");
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(%request_id, error = %e, "request failed");
            ApiError::from_transport(&e)
        })?;

        let status = response.status();
        tracing::debug!(%request_id, status = status.as_u16(), "response received");

        if status == StatusCode::UNAUTHORIZED {
            self.intercept_unauthorized(path, grant.as_ref());
            return Err(ApiError::Unauthorized { path: path.to_owned() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), message: error_message(&body), body });
        }
        Ok(response)
    }

    fn intercept_unauthorized(&self, path: &str, grant: Option<&BearerGrant>) {
        if is_login_path(path) {
            return;
        }
        match grant {
            Some(grant) => {
                if !self.session.expire(grant.generation) {
                    tracing::debug!(path, generation = grant.generation, "ignoring 401 from superseded session");
                }
            }
            None => tracing::debug!(path, "401 on request sent without a session"),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn authorize(builder: reqwest::RequestBuilder, grant: Option<&BearerGrant>) -> reqwest::RequestBuilder {
    match grant {
        Some(grant) => builder.header(AUTHORIZATION, bearer_value(&grant.token)),
        None => builder,
    }
}

pub(crate) fn bearer_value(token: &str) -> String {
    format!("Bearer {token}")
}

/// Join base and path with exactly one `/` between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{path}")
    }
}

/// Whether `path` addresses the login endpoint (query string ignored).
pub(crate) fn is_login_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_matches('/') == LOGIN_PATH.trim_matches('/')
}

/// The `message` field of a JSON error body, if any.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}
