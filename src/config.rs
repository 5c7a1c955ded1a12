//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_LOGIN_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_URL: &str = "ZELUS_API_URL";
pub const ENV_LOGIN_TIMEOUT_MS: &str = "ZELUS_LOGIN_TIMEOUT_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ZELUS_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "ZELUS_CONNECT_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base API URL, stored without a trailing slash.
    pub api_url: String,
    pub login_timeout: Duration,
    /// Applied to authenticated requests that don't set their own timeout.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Config with the default timeouts for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no `http://` or `https://` scheme.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            login_timeout: Duration::from_millis(DEFAULT_LOGIN_TIMEOUT_MS),
            request_timeout: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Required:
    /// - `ZELUS_API_URL`
    ///
    /// Optional:
    /// - `ZELUS_LOGIN_TIMEOUT_MS`: default 10000
    /// - `ZELUS_REQUEST_TIMEOUT_SECS`: unset means no timeout
    /// - `ZELUS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is missing or any value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup(ENV_API_URL).ok_or(ConfigError::MissingVar { var: ENV_API_URL })?;
        let mut config = Self::new(&raw_url)?;

        if let Some(ms) = parse_u64(&lookup, ENV_LOGIN_TIMEOUT_MS)? {
            config.login_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_u64(&lookup, ENV_CONNECT_TIMEOUT_SECS)? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { var: key, value: raw.clone() })
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}
