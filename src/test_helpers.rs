//! In-process mock API for tests.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};

use crate::client::ZelusClient;
use crate::config::ClientConfig;

pub const TEST_EMAIL: &str = "teste01@mail.com";
pub const TEST_PASSWORD: &str = "123456";
pub const TEST_TOKEN: &str = "abc123";

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_api(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server failed");
    });
    format!("http://{addr}")
}

#[must_use]
pub fn test_client(base_url: &str) -> ZelusClient {
    test_client_with(ClientConfig::new(base_url).expect("valid base url"))
}

#[must_use]
pub fn test_client_with(config: ClientConfig) -> ZelusClient {
    ZelusClient::new(config).expect("client should build")
}

#[must_use]
pub fn login_body(token: &str) -> Value {
    json!({
        "user": { "id": 1, "name": "T", "email": TEST_EMAIL, "cpf": "00000000000" },
        "token": { "type": "bearer", "token": token }
    })
}

/// `POST /session` that always succeeds with [`TEST_TOKEN`].
pub fn session_ok() -> axum::routing::MethodRouter {
    post(|| async { axum::Json(login_body(TEST_TOKEN)) })
}

/// `POST /session` that waits before answering with `token`.
pub fn session_delayed(delay: Duration, token: &'static str) -> axum::routing::MethodRouter {
    post(move || async move {
        tokio::time::sleep(delay).await;
        axum::Json(login_body(token))
    })
}

/// Bearer header of the incoming request, echoed as JSON.
pub async fn echo_authorization(headers: HeaderMap) -> Response {
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(ToOwned::to_owned);
    axum::Json(json!({ "authorization": auth })).into_response()
}

pub async fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, axum::Json(json!({ "message": "Unauthorized" }))).into_response()
}

/// Client logged in against a mock serving `/session` plus `extra` routes.
pub async fn logged_in_client(extra: Router) -> ZelusClient {
    let base = spawn_api(Router::new().route("/session", session_ok()).merge(extra)).await;
    let client = test_client(&base);
    client.login(TEST_EMAIL, TEST_PASSWORD).await.expect("login should succeed");
    client
}
