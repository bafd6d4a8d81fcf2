//! Webflow API v2 for webflow-cloud
//!
//! This crate is the network half of webflow-cloud: a resilient invoker that
//! every API call goes through, a classifier that turns failures into
//! actionable [`ApiError`]s, and the per-kind adapters implementing
//! [`webflow_cloud::Resource`].
//!
//! # Features
//!
//! - Bounded retries (3 by default) for rate limits and transport failures
//! - `Retry-After` pacing, exponential backoff otherwise, capped at 30s
//! - Cancellation at every wait and while a request is in flight
//! - Redirects, robots.txt and CMS collection items
//!
//! # Requirements
//!
//! - `WEBFLOW_API_TOKEN`: a site or workspace API token
//! - `WEBFLOW_API_BASE_URL` (optional): override for `https://api.webflow.com`
//!
//! # Example
//!
//! ```ignore
//! use webflow_cloud::{CancellationToken, Reconciler};
//! use webflow_cloud_api::{ApiConfig, WebflowProvider};
//!
//! let provider = WebflowProvider::new(&ApiConfig::from_env()?)?;
//!
//! let auth = provider.check_auth(&CancellationToken::new()).await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let reconciler = Reconciler::new(provider.registry());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod resources;
pub mod retry;
pub mod transport;

pub use client::{API_VERSION, ApiResponse, WebflowClient};
pub use config::{ApiConfig, redact_token, validate_token};
pub use error::{ApiError, ErrorKind, Result, classify_status, classify_transport};
pub use provider::WebflowProvider;
pub use resources::{CollectionItemResource, RedirectResource, RobotsTxtResource};
pub use retry::RetryPolicy;
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport, TransportFailure};
