//! `ZelusClient`: session plus authenticated request facade.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every screen holds a clone of one `ZelusClient`. Login and logout mutate
//! the shared `SessionStore`; `authenticated_request` is the single call
//! surface for protected endpoints. Errors are returned unchanged for the
//! calling screen to present; the client never retries.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError, LoginError};
use crate::http::{HttpClient, RequestBody, RequestOptions};
use crate::login;
use crate::session::SessionStore;
use crate::types::User;

/// Decoded response of an authenticated request.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub headers: HeaderMap,
    pub data: T,
}

#[derive(Clone, Debug)]
pub struct ZelusClient {
    config: ClientConfig,
    http: HttpClient,
    session: SessionStore,
}

impl ZelusClient {
    /// Build a client with a fresh, logged-out session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_session(config, SessionStore::new())
    }

    /// Build a client around an existing session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_session(config: ClientConfig, session: SessionStore) -> Result<Self, ConfigError> {
        let http = HttpClient::new(&config, session.clone())?;
        Ok(Self { config, http, session })
    }

    /// Build a client from `ZELUS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ClientConfig::from_env()?)
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Log in and populate the session.
    ///
    /// On failure the message is recorded as the session's last error and the
    /// error is returned so the caller can alert the user.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::InFlight`] if a login is already running,
    /// [`LoginError::Superseded`] if `logout` ran while it was in flight, and
    /// the login failure otherwise.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, LoginError> {
        let ticket = self.session.begin_login()?;
        tracing::info!(email, "login attempt");

        match login::exchange_credentials(&self.http, self.config.login_timeout, email, password).await {
            Ok((user, token)) => {
                self.session.complete_login(ticket, user.clone(), token)?;
                tracing::info!(user_id = user.id, "login succeeded");
                Ok(user)
            }
            Err(err) => {
                tracing::warn!(email, error = %err, "login failed");
                self.session.fail_login(ticket, err.to_string())?;
                Err(err)
            }
        }
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// Call a protected endpoint and decode its JSON body.
    ///
    /// An empty body decodes as JSON `null`, so `T` may be `()`,
    /// `Option<_>` or `serde_json::Value` for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error from the wrapper, or
    /// [`ApiError::Decode`] if the body doesn't match `T`.
    pub async fn authenticated_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.http.send(method, path, body, options).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| ApiError::from_transport(&e))?;
        let data = decode_body(&bytes)?;
        Ok(ApiResponse { status, headers, data })
    }

    /// `GET` shorthand returning only the decoded data.
    ///
    /// # Errors
    ///
    /// Same as [`ZelusClient::authenticated_request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.authenticated_request(Method::GET, path, RequestBody::Empty, RequestOptions::default())
            .await
            .map(|response| response.data)
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) { b"null".as_slice() } else { bytes };
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
