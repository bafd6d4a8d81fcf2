//! Per-kind resource adapters
//!
//! Each adapter implements [`webflow_cloud::Resource`] on top of the shared
//! [`WebflowClient`](crate::client::WebflowClient). Inputs are validated
//! before any network call.

pub mod collection_item;
pub mod redirect;
pub mod robots_txt;

pub use collection_item::CollectionItemResource;
pub use redirect::RedirectResource;
pub use robots_txt::RobotsTxtResource;

use regex::Regex;
use std::sync::LazyLock;
use webflow_cloud::{CloudError, DesiredState, PREVIEW_PREFIX, Result};

static OBJECT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{24}$").expect("object ID pattern is valid"));

static PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[a-zA-Z0-9\-_/.]*$").expect("path pattern is valid"));

/// Check a Webflow object ID (site, collection): 24 lowercase hex characters.
///
/// Dry-run placeholders (`preview-...`) are accepted, since a dependent
/// resource only learns the real ID after its parent is created.
pub fn validate_object_id(field: &str, value: Option<&str>) -> Result<()> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(CloudError::Validation(format!(
                "{} is required but was not provided. Provide a 24-character lowercase \
                 hexadecimal ID (e.g., '5f0c8c9e1c9d440000e8d8c3') from the Webflow dashboard",
                field
            )));
        }
    };

    if value.starts_with(PREVIEW_PREFIX) || OBJECT_ID_PATTERN.is_match(value) {
        return Ok(());
    }

    Err(CloudError::Validation(format!(
        "{} has invalid format: got '{}'. Expected a 24-character lowercase hexadecimal \
         string (e.g., '5f0c8c9e1c9d440000e8d8c3') containing only a-f and 0-9",
        field, value
    )))
}

/// Check a URL path used by redirects
pub fn validate_path(field: &str, value: Option<&str>) -> Result<()> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(CloudError::Validation(format!(
                "{} is required but was not provided. Provide a URL path starting with '/' \
                 (e.g., '/old-page', '/blog/2023')",
                field
            )));
        }
    };

    if !value.starts_with('/') {
        return Err(CloudError::Validation(format!(
            "{} must start with '/': got '{}' (e.g., '/old-page', '/blog/2023')",
            field, value
        )));
    }

    if !PATH_PATTERN.is_match(value) {
        return Err(CloudError::Validation(format!(
            "{} contains invalid characters: got '{}'. Allowed characters: A-Z, a-z, 0-9, \
             hyphens (-), underscores (_), forward slashes (/) and dots (.)",
            field, value
        )));
    }

    Ok(())
}

/// Required string field
pub(crate) fn required_str<'a>(desired: &'a DesiredState, field: &str) -> Result<&'a str> {
    desired
        .get_str(field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CloudError::Validation(format!("{} is required but was not provided", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_object_id() {
        assert!(validate_object_id("siteId", Some("5f0c8c9e1c9d440000e8d8c3")).is_ok());
        assert!(validate_object_id("siteId", Some("preview-1700000000")).is_ok());

        let err = validate_object_id("siteId", None).unwrap_err();
        assert!(err.to_string().contains("siteId is required"));

        for bad in ["5F0C8C9E1C9D440000E8D8C3", "abc", "5f0c8c9e1c9d440000e8d8c3x", ""] {
            assert!(
                validate_object_id("siteId", Some(bad)).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_path() {
        for ok in ["/", "/old-page", "/blog/2023", "/a_b/c.html"] {
            assert!(validate_path("sourcePath", Some(ok)).is_ok(), "{ok} should pass");
        }

        let err = validate_path("sourcePath", Some("old")).unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));

        let err = validate_path("sourcePath", Some("/old page?")).unwrap_err();
        assert!(err.to_string().contains("invalid characters"));

        assert!(validate_path("sourcePath", None).is_err());
    }
}
