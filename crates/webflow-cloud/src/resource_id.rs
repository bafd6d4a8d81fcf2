//! Composite resource identifiers
//!
//! Objects scoped under a parent are addressed as
//! `{parentId}/{segment}/{objectId}` (e.g. `{siteId}/redirects/{redirectId}`),
//! singletons as `{parentId}/{segment}` (e.g. `{siteId}/robots.txt`).
//!
//! The object ID is everything after the fixed segment, so object IDs that
//! contain the separator survive a round trip.

use crate::error::{CloudError, Result};
use std::fmt;

/// Separator between ID components
pub const SEPARATOR: char = '/';

/// Prefix of object IDs synthesized during dry runs
pub const PREVIEW_PREFIX: &str = "preview-";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    parent: String,
    segment: String,
    object: Option<String>,
}

impl ResourceId {
    /// ID of an object scoped under `parent`
    pub fn new(
        parent: impl Into<String>,
        segment: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.into(),
            segment: segment.into(),
            object: Some(object.into()),
        }
    }

    /// ID of the only object of its kind under `parent`
    pub fn singleton(parent: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            segment: segment.into(),
            object: None,
        }
    }

    /// Placeholder ID used when the remote system has not assigned one yet
    pub fn preview(parent: impl Into<String>, segment: impl Into<String>) -> Self {
        let object = format!("{}{}", PREVIEW_PREFIX, chrono::Utc::now().timestamp());
        Self::new(parent, segment, object)
    }

    /// Decode `{parent}/{segment}/{object}`
    pub fn parse(resource_id: &str, segment: &str) -> Result<Self> {
        let expected = format!("{{parentId}}/{}/{{objectId}}", segment);
        let (parent, rest) = split_parent(resource_id, &expected)?;

        let object = rest
            .strip_prefix(segment)
            .and_then(|r| r.strip_prefix(SEPARATOR))
            .ok_or_else(|| {
                CloudError::InvalidResourceId(format!(
                    "expected {}, got: {}",
                    expected, resource_id
                ))
            })?;

        if object.is_empty() {
            return Err(CloudError::InvalidResourceId(format!(
                "object ID is empty in '{}': expected {}",
                resource_id, expected
            )));
        }

        Ok(Self::new(parent, segment, object))
    }

    /// Decode `{parent}/{segment}`
    pub fn parse_singleton(resource_id: &str, segment: &str) -> Result<Self> {
        let expected = format!("{{parentId}}/{}", segment);
        let (parent, rest) = split_parent(resource_id, &expected)?;

        if rest != segment {
            return Err(CloudError::InvalidResourceId(format!(
                "expected {}, got: {}",
                expected, resource_id
            )));
        }

        Ok(Self::singleton(parent, segment))
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    /// Object ID, failing for singleton IDs
    pub fn object_id(&self) -> Result<&str> {
        self.object.as_deref().ok_or_else(|| {
            CloudError::InvalidResourceId(format!("'{}' does not name an object", self))
        })
    }

    /// Whether the object ID is a dry-run placeholder
    pub fn is_preview(&self) -> bool {
        self.object
            .as_deref()
            .is_some_and(|o| o.starts_with(PREVIEW_PREFIX))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Some(object) => write!(f, "{}/{}/{}", self.parent, self.segment, object),
            None => write!(f, "{}/{}", self.parent, self.segment),
        }
    }
}

/// Encode `{parent}/{segment}/{object}`
pub fn encode(parent: &str, segment: &str, object: &str) -> String {
    ResourceId::new(parent, segment, object).to_string()
}

/// Decode `{parent}/{segment}/{object}` into `(parent, object)`
pub fn decode(resource_id: &str, segment: &str) -> Result<(String, String)> {
    let id = ResourceId::parse(resource_id, segment)?;
    let object = id.object_id()?.to_string();
    Ok((id.parent, object))
}

fn split_parent<'a>(resource_id: &'a str, expected: &str) -> Result<(&'a str, &'a str)> {
    if resource_id.is_empty() {
        return Err(CloudError::InvalidResourceId(format!(
            "resource ID cannot be empty: expected {}",
            expected
        )));
    }

    let (parent, rest) = resource_id.split_once(SEPARATOR).ok_or_else(|| {
        CloudError::InvalidResourceId(format!("expected {}, got: {}", expected, resource_id))
    })?;

    if parent.is_empty() {
        return Err(CloudError::InvalidResourceId(format!(
            "parent ID is empty in '{}': expected {}",
            resource_id, expected
        )));
    }

    Ok((parent, rest))
}
