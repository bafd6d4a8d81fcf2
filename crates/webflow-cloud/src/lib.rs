//! Webflow Cloud reconciliation engine
//!
//! This crate holds the provider-independent half of declarative Webflow
//! management: the desired/recorded state model, the per-field diff engine,
//! the composite resource-ID codec, the `Resource` trait implemented by every
//! object kind, and plan/apply over a set of declared resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  webflow CLI                     │
//! │            (plan / apply / destroy)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 webflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Reconciler (plan / apply / refresh)      │   │
//! │  │  trait Resource { create, read, ... }     │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Diff / IDs   │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼──────────────────────────────────────────┐
//! │ webflow-cloud-api                                 │
//! │ invoker (retry / backoff / 429) + kind adapters   │
//! └───────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod diff;
pub mod error;
pub mod reconcile;
pub mod resource;
pub mod resource_id;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use diff::{ChangeSet, DiffMode, FieldChange, Mutability, ResourceSchema, diff};
pub use error::{CloudError, Result};
pub use reconcile::{Reconciler, RefreshReport, ResourceRegistry};
pub use resource::{AuthStatus, Created, OpContext, Resource, ResourceConfig, ResourceSet};
pub use resource_id::{ResourceId, PREVIEW_PREFIX};
pub use state::{
    DesiredState, GlobalState, RecordedState, ResourceEntry, StateLock, StateManager,
};
pub use tokio_util::sync::CancellationToken;
