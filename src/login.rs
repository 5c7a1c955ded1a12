//! Credential exchange against `POST /session`.
//!
//! The API nests the bearer token one level deep: `{"user": {...}, "token":
//! {"token": "..."}}`. Some server builds put the token envelope inside the
//! user object instead, so both places are checked. A 2xx without a non-empty
//! token is a failure.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoginError;
use crate::http::{HttpClient, LOGIN_PATH, error_message};
use crate::types::User;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    #[serde(default)]
    token: Option<String>,
}

/// Exchange credentials for a user record and bearer token.
///
/// Inputs are sent as-is; validation belongs to the calling screen.
pub(crate) async fn exchange_credentials(
    http: &HttpClient,
    timeout: Duration,
    email: &str,
    password: &str,
) -> Result<(User, String), LoginError> {
    let response = http
        .request(Method::POST, LOGIN_PATH)
        .timeout(timeout)
        .json(&LoginRequest { email, password })
        .send()
        .await
        .map_err(|e| transport_error(&e))?;

    let status = response.status();
    let body = response.text().await.map_err(|e| transport_error(&e))?;

    if !status.is_success() {
        return Err(LoginError::Rejected { status: status.as_u16(), message: rejection_message(status.as_u16(), &body) });
    }

    parse_login_response(&body)
}

fn transport_error(error: &reqwest::Error) -> LoginError {
    if error.is_timeout() { LoginError::Timeout } else { LoginError::network(error.to_string()) }
}

/// Server `message` when present, otherwise the generic status text.
pub(crate) fn rejection_message(status: u16, body: &str) -> String {
    error_message(body).unwrap_or_else(|| format!("Request failed with status code {status}"))
}

pub(crate) fn parse_login_response(body: &str) -> Result<(User, String), LoginError> {
    let value: Value = serde_json::from_str(body).map_err(|e| LoginError::InvalidResponse(e.to_string()))?;

    let Some(user_value) = value.get("user").filter(|user| user.is_object()) else {
        return Err(LoginError::InvalidResponse("login response has no user".to_owned()));
    };

    let token = extract_token(value.get("token"))
        .or_else(|| extract_token(user_value.get("token")))
        .ok_or(LoginError::MissingToken)?;

    let user = User::deserialize(user_value).map_err(|e| LoginError::InvalidResponse(e.to_string()))?;
    Ok((user, token))
}

fn extract_token(envelope: Option<&Value>) -> Option<String> {
    let envelope = TokenEnvelope::deserialize(envelope?).ok()?;
    envelope.token.filter(|token| !token.is_empty())
}
