//! Error types for configuration, login, and authenticated requests.
//!
//! DESIGN
//! ======
//! `LoginError`'s `Display` is the user-facing message: the session store
//! records it verbatim as the last login error, and screens show it in an
//! alert. `ApiError` keeps the status and raw body so callers can build their
//! own message; `ApiError::message` prefers the server's `message` field.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

// =============================================================================
// MESSAGES
// =============================================================================

/// Fallback when neither the server nor the transport gave a usable message.
pub const DEFAULT_LOGIN_ERROR: &str = "Ocorreu um erro durante o login";

/// Shown when the login call exceeds its timeout.
pub const LOGIN_TIMEOUT_MESSAGE: &str = "Tempo de conexão esgotado. Verifique sua internet e tente novamente.";

/// Login succeeded at the HTTP level but carried no bearer token.
pub const MISSING_TOKEN_MESSAGE: &str = "No access token received";

/// Notice surfaced once when a 401 ends the current session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Sua sessão expirou. Faça login novamente.";

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable, grepable classification shared by every error in the crate.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing config: env var {var} not set")]
    MissingVar { var: &'static str },

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("invalid API URL {0:?}: expected http:// or https://")]
    InvalidApiUrl(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingVar { .. } => "E_CONFIG_MISSING",
            Self::InvalidValue { .. } => "E_CONFIG_INVALID",
            Self::InvalidApiUrl(_) => "E_CONFIG_API_URL",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

// =============================================================================
// LOGIN
// =============================================================================

/// Failure of a `login` call. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// Another login is still in flight.
    #[error("login already in progress")]
    InFlight,

    /// A logout happened while this login was in flight; its result was discarded.
    #[error("login superseded by logout")]
    Superseded,

    #[error("{}", LOGIN_TIMEOUT_MESSAGE)]
    Timeout,

    /// Non-2xx response. `message` is the server's `message` field, or the
    /// generic status text when the body had none.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("{}", MISSING_TOKEN_MESSAGE)]
    MissingToken,

    #[error("{0}")]
    InvalidResponse(String),
}

impl LoginError {
    /// Build a transport error, falling back to the default message when the
    /// underlying error rendered as an empty string.
    pub(crate) fn network(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Network(DEFAULT_LOGIN_ERROR.to_owned())
        } else {
            Self::Network(message)
        }
    }
}

impl ErrorCode for LoginError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InFlight => "E_LOGIN_IN_FLIGHT",
            Self::Superseded => "E_LOGIN_SUPERSEDED",
            Self::Timeout => "E_LOGIN_TIMEOUT",
            Self::Rejected { .. } => "E_LOGIN_REJECTED",
            Self::Network(_) => "E_LOGIN_NETWORK",
            Self::MissingToken => "E_LOGIN_MISSING_TOKEN",
            Self::InvalidResponse(_) => "E_LOGIN_INVALID_RESPONSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_) | Self::Rejected { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// API
// =============================================================================

/// Failure of an authenticated request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered 401. When the request was issued under the current
    /// session, the session has already been logged out.
    #[error("unauthorized: {path}")]
    Unauthorized { path: String },

    #[error("Request failed with status code {status}")]
    Status { status: u16, message: Option<String>, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub(crate) fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_builder() {
            Self::InvalidRequest(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's `message` field when present, otherwise the error text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Status { message: Some(message), .. } => message.clone(),
            Self::Unauthorized { .. } => SESSION_EXPIRED_MESSAGE.to_owned(),
            other => other.to_string(),
        }
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::Status { .. } => "E_API_STATUS",
            Self::Timeout => "E_API_TIMEOUT",
            Self::Network(_) => "E_API_NETWORK",
            Self::Decode(_) => "E_API_DECODE",
            Self::InvalidRequest(_) => "E_API_INVALID_REQUEST",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// Local validation rejected a field before any request was sent.
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },

    #[error("Usuário já cadastrado.")]
    AlreadyRegistered,

    #[error("CPF inválido.")]
    InvalidCpf,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ErrorCode for RegisterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "E_REGISTER_INVALID",
            Self::AlreadyRegistered => "E_REGISTER_EXISTS",
            Self::InvalidCpf => "E_REGISTER_CPF",
            Self::Api(inner) => inner.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(inner) => inner.retryable(),
            _ => false,
        }
    }
}
