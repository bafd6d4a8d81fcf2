//! API configuration

use crate::error::{ApiError, Result};
use crate::retry::RetryPolicy;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.webflow.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_ENV: &str = "WEBFLOW_API_TOKEN";
const BASE_URL_ENV: &str = "WEBFLOW_API_BASE_URL";
const MIN_TOKEN_LEN: usize = 10;

/// Connection settings for the Webflow API
#[derive(Clone)]
pub struct ApiConfig {
    pub api_token: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ApiConfig {
    /// Create a config for `api_token` against the public API
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        validate_token(&api_token)?;
        Ok(Self {
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    /// Create ApiConfig from environment variables
    ///
    /// `WEBFLOW_API_TOKEN` is required, `WEBFLOW_API_BASE_URL` is optional.
    pub fn from_env() -> Result<Self> {
        let api_token =
            std::env::var(TOKEN_ENV).map_err(|_| ApiError::MissingEnvVar(TOKEN_ENV.to_string()))?;
        let config = Self::new(api_token)?;

        match std::env::var(BASE_URL_ENV) {
            Ok(base_url) if !base_url.trim().is_empty() => config.with_base_url(base_url),
            _ => Ok(config),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(ApiError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_token", &redact_token(&self.api_token))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Basic sanity check of an API token
pub fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(ApiError::InvalidConfig(format!(
            "API token cannot be empty. Set {} to a Webflow API token",
            TOKEN_ENV
        )));
    }
    if token.len() < MIN_TOKEN_LEN {
        return Err(ApiError::InvalidConfig(
            "API token appears invalid (too short). Webflow API tokens are typically \
             40+ characters; generate a new one in the Webflow dashboard"
                .to_string(),
        ));
    }
    Ok(())
}

/// Token as it may appear in logs
pub fn redact_token(token: &str) -> &'static str {
    if token.is_empty() {
        "<empty>"
    } else {
        "[REDACTED]"
    }
}
