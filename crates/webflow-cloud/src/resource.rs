//! Resource trait definition
//!
//! Every managed object kind (redirect, robots.txt, collection item, ...)
//! implements [`Resource`]. The reconciler only ever talks to kinds through
//! this trait.

use crate::diff::{self, ChangeSet, DiffMode, ResourceSchema};
use crate::error::{CloudError, Result};
use crate::state::{DesiredState, RecordedState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Per-operation context threaded through every call
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
    dry_run: bool,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// In dry-run mode create/update synthesize state without network calls
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Outcome of a successful create
#[derive(Debug, Clone)]
pub struct Created {
    /// Composite resource ID of the new object
    pub id: String,

    pub state: RecordedState,
}

/// A managed object kind
#[async_trait]
pub trait Resource: Send + Sync {
    /// Kind name used in desired-state files (e.g., "redirect")
    fn kind(&self) -> &str;

    /// Declared mutability of every field
    fn schema(&self) -> &ResourceSchema;

    /// Check caller input before any network call
    fn validate(&self, _desired: &DesiredState) -> Result<()> {
        Ok(())
    }

    /// Apply the normalization the remote system applies to stored values.
    ///
    /// Both sides of a diff go through this, so a state that was read back
    /// from the remote never shows phantom changes against its own inputs.
    fn normalize(&self, state: &DesiredState) -> DesiredState {
        state.clone()
    }

    /// Diff mode used by [`Resource::diff`]
    fn diff_mode(&self) -> DiffMode {
        DiffMode::Exhaustive
    }

    /// Compare desired state with the recorded one
    fn diff(&self, desired: &DesiredState, recorded: &RecordedState) -> ChangeSet {
        diff::diff_inputs(
            self.schema(),
            &self.normalize(desired),
            &self.normalize(&recorded.inputs),
            self.diff_mode(),
        )
    }

    /// Create the remote object
    async fn create(&self, desired: &DesiredState, ctx: &OpContext) -> Result<Created>;

    /// Read the remote object. `Ok(None)` means it was deleted out of band.
    async fn read(
        &self,
        id: &str,
        prior: Option<&RecordedState>,
        ctx: &OpContext,
    ) -> Result<Option<RecordedState>>;

    /// Apply update-compatible changes in place
    async fn update(
        &self,
        id: &str,
        desired: &DesiredState,
        prior: &RecordedState,
        ctx: &OpContext,
    ) -> Result<RecordedState>;

    /// Delete the remote object. Deleting an absent object succeeds.
    async fn delete(&self, id: &str, ctx: &OpContext) -> Result<()>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/application information if available
    pub account_info: Option<String>,

    /// Granted scopes if reported
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            scopes: Vec::new(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            scopes: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

/// Set of resources to be managed, indexed by logical name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a desired-state document:
    ///
    /// ```json
    /// { "resources": [ { "name": "old-blog", "kind": "redirect", "properties": { ... } } ] }
    /// ```
    pub fn from_json(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default)]
            resources: Vec<ResourceConfig>,
        }

        let document: Document = serde_json::from_str(content)?;
        let mut set = Self::new();
        for resource in document.resources {
            if set.resources.contains_key(&resource.name) {
                return Err(CloudError::InvalidConfig(format!(
                    "resource name '{}' is declared more than once. \
                     Every resource needs a unique name",
                    resource.name
                )));
            }
            set.add(resource);
        }
        Ok(set)
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.name.clone(), resource);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_kind(&self, kind: &str) -> Vec<&ResourceConfig> {
        self.resources.values().filter(|r| r.kind == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Declaration of one managed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Logical name, stable across runs
    pub name: String,

    /// Resource kind (e.g., "redirect")
    pub kind: String,

    /// Desired field values
    #[serde(default)]
    pub properties: DesiredState,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, properties: DesiredState) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            properties,
        }
    }
}
