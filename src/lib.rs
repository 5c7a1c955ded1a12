//! Zelus client core: session lifecycle and authenticated requests.
//!
//! ARCHITECTURE
//! ============
//! - `session`: in-memory store of the logged-in user and bearer token.
//! - `http`: request pipeline that injects the token and turns a 401 into a
//!   logout of the session the request was issued under.
//! - `login`: the `POST /session` credential exchange.
//! - `client`: `ZelusClient`, the facade every screen calls.
//! - `resources`: typed helpers for posts, comments, users and lookups.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
mod login;
pub mod resources;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{ApiResponse, ZelusClient};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, ErrorCode, LoginError, RegisterError};
pub use http::{RequestBody, RequestOptions};
pub use session::{SessionEvent, SessionPhase, SessionSnapshot, SessionStore};
pub use types::User;
