//! Webflow API error types and classification
//!
//! Every failure reaching the caller says what went wrong and what to do
//! about it. HTTP statuses go through [`classify_status`], transport
//! failures through [`classify_transport`].

use crate::transport::TransportFailure;
use std::time::Duration;
use thiserror::Error;
use webflow_cloud::CloudError;

/// Longest response body embedded in an error message
pub const MAX_BODY_IN_MESSAGE: usize = 512;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(
        "bad request: the Webflow API rejected the request. Details: {body}. \
         Check the resource configuration and make sure every required field has a valid value"
    )]
    BadRequest { body: String },

    #[error(
        "unauthorized: authentication failed. Your Webflow API token is invalid or has expired. \
         Verify the token in the Webflow dashboard (Site settings > Apps & integrations > API access) \
         and update WEBFLOW_API_TOKEN"
    )]
    Unauthorized,

    #[error(
        "forbidden: access denied. The API token lacks permission for this resource. \
         Check that the token has the required scopes and that the site belongs to the token's workspace"
    )]
    Forbidden,

    #[error(
        "not found: the Webflow resource does not exist. \
         Verify the IDs are correct and that the resource was not deleted in the dashboard"
    )]
    NotFound,

    #[error(
        "rate limited: Webflow API rate limit exceeded (HTTP 429). \
         Retry attempt {attempt} of {total}, waiting {wait:?} before the next attempt. \
         If this persists, wait a few minutes before trying again"
    )]
    RateLimited {
        attempt: u32,
        total: u32,
        wait: Duration,
    },

    #[error(
        "server error: Webflow API returned HTTP {status}. Details: {body}. \
         This is a problem on Webflow's side; wait a few minutes and try again"
    )]
    Server { status: u16, body: String },

    #[error(
        "unexpected response (HTTP {status}): {body}. \
         Check the Webflow status page and retry; contact Webflow support if it persists"
    )]
    Unexpected { status: u16, body: String },

    #[error(
        "network timeout: the request to the Webflow API timed out ({detail}). \
         Check your internet connection and the Webflow API status, then retry"
    )]
    Timeout { detail: String },

    #[error(
        "connection failed: unable to connect to the Webflow API ({detail}). \
         Check your internet connection, DNS resolution (try: nslookup api.webflow.com) \
         and firewall or proxy settings"
    )]
    Connection { detail: String },

    #[error(
        "network error: the request to the Webflow API failed ({detail}). \
         Check your internet connection and retry in a few minutes"
    )]
    Network { detail: String },

    #[error("{operation} cancelled")]
    Cancelled { operation: String },

    #[error("{operation} failed after {attempts} attempts, retry budget exhausted: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("failed to decode response of {operation}: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

/// Coarse category of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    RateLimited,
    Client,
    Server,
    NotFound,
    Cancelled,
    RetriesExhausted,
    Config,
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest { .. }
            | ApiError::Unauthorized
            | ApiError::Forbidden
            | ApiError::Unexpected { .. } => ErrorKind::Client,
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Timeout { .. } | ApiError::Connection { .. } | ApiError::Network { .. } => {
                ErrorKind::Transport
            }
            ApiError::Cancelled { .. } => ErrorKind::Cancelled,
            ApiError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::InvalidConfig(_) | ApiError::MissingEnvVar(_) => ErrorKind::Config,
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Cloud(e) => match e {
                CloudError::Validation(_) | CloudError::InvalidResourceId(_) => {
                    ErrorKind::Validation
                }
                CloudError::ResourceNotFound(_) => ErrorKind::NotFound,
                CloudError::Cancelled(_) => ErrorKind::Cancelled,
                _ => ErrorKind::Config,
            },
        }
    }

    /// Innermost error, looking through an exhausted retry budget
    pub fn root(&self) -> &ApiError {
        match self {
            ApiError::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }

    /// Whether the remote object is absent; a read treats this as deleted
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::RateLimited)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

/// Map a non-success HTTP status and its body to an error
///
/// 429 is classified without pacing context; the invoker builds its own
/// `RateLimited` with attempt numbers and the computed wait.
pub fn classify_status(status: u16, body: &str) -> ApiError {
    let body = truncate_for_logging(body.trim(), MAX_BODY_IN_MESSAGE);
    match status {
        400 => ApiError::BadRequest { body },
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound,
        429 => ApiError::RateLimited {
            attempt: 1,
            total: 1,
            wait: Duration::ZERO,
        },
        500..=599 => ApiError::Server { status, body },
        _ => ApiError::Unexpected { status, body },
    }
}

/// Map a transport-level failure to an error
pub fn classify_transport(failure: &TransportFailure) -> ApiError {
    let text = failure.message.to_lowercase();
    let detail = failure.message.clone();

    if failure.timeout
        || text.contains("timeout")
        || text.contains("timed out")
        || text.contains("deadline exceeded")
    {
        ApiError::Timeout { detail }
    } else if failure.connect
        || text.contains("connection refused")
        || text.contains("no such host")
        || text.contains("dns")
        || text.contains("failed to lookup address")
    {
        ApiError::Connection { detail }
    } else {
        ApiError::Network { detail }
    }
}

/// Shorten `value` to at most `max_len` characters, noting the original length
pub fn truncate_for_logging(value: &str, max_len: usize) -> String {
    let total = value.chars().count();
    if total <= max_len {
        return value.to_string();
    }
    let head: String = value.chars().take(max_len).collect();
    format!("{}... (truncated, {} total chars)", head, total)
}

impl From<ApiError> for CloudError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Cloud(e) => e,
            ApiError::NotFound => CloudError::ResourceNotFound(ApiError::NotFound.to_string()),
            e @ (ApiError::Unauthorized | ApiError::Forbidden) => {
                CloudError::AuthenticationFailed(e.to_string())
            }
            ApiError::Cancelled { operation } => CloudError::Cancelled(operation),
            ApiError::Validation(msg) => CloudError::Validation(msg),
            ApiError::InvalidConfig(msg) => CloudError::InvalidConfig(msg),
            e @ ApiError::MissingEnvVar(_) => CloudError::InvalidConfig(e.to_string()),
            e => CloudError::ApiError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
