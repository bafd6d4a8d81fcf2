//! Action types for resource reconciliation

use crate::diff::{ChangeSet, FieldChange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a planned action for a managed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource kind (e.g., "redirect", "collection-item")
    pub resource_type: String,

    /// Logical resource name from the desired-state file
    pub resource_name: String,

    /// Composite ID of the existing remote object, if any
    pub remote_id: Option<String>,

    /// Description of the action
    pub description: String,

    /// Per-field classification behind an update or replace
    #[serde(default)]
    pub changes: ChangeSet,

    /// Additional details about the action
    #[serde(default)]
    pub details: HashMap<String, serde_json::Value>,
}

impl Action {
    pub fn new(
        action_type: ActionType,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_name = resource_name.into();
        Self {
            id: format!("{}-{}", action_type, resource_name),
            description: format!("{} {} {}", action_type, resource_type, resource_name),
            action_type,
            resource_type,
            resource_name,
            remote_id: None,
            changes: ChangeSet::new(),
            details: HashMap::new(),
        }
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    pub fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Changed field names rendered as `name (update)` / `size (replace)`
    pub fn changed_field_summary(&self) -> Vec<String> {
        self.changes
            .changed_fields()
            .map(|(name, change)| match change {
                FieldChange::Replace => format!("{} (replace)", name),
                FieldChange::Update => format!("{} (update)", name),
                FieldChange::Unchanged => name.to_string(),
            })
            .collect()
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Delete the existing resource, then create it again
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the action
    pub action_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_summary() {
        let mut changes = ChangeSet::new();
        changes.insert("sourcePath", FieldChange::Replace);

        let plan = Plan::new(vec![
            Action::new(ActionType::Create, "redirect", "a"),
            Action::new(ActionType::Replace, "redirect", "b").with_changes(changes),
            Action::new(ActionType::NoOp, "robots-txt", "c"),
        ]);

        assert!(plan.has_changes);
        let summary = plan.summary();
        assert_eq!(summary.create, 1);
        assert_eq!(summary.replace, 1);
        assert_eq!(summary.no_change, 1);
        assert_eq!(
            summary.to_string(),
            "1 to create, 0 to update, 1 to replace, 0 to delete, 1 unchanged"
        );
    }

    #[test]
    fn test_noop_only_plan_has_no_changes() {
        let plan = Plan::new(vec![Action::new(ActionType::NoOp, "redirect", "a")]);
        assert!(!plan.has_changes);
        assert!(!Plan::empty().has_changes);
    }

    #[test]
    fn test_changed_field_summary() {
        let mut changes = ChangeSet::new();
        changes.insert("name", FieldChange::Update);
        changes.insert("size", FieldChange::Replace);
        let action = Action::new(ActionType::Replace, "asset", "logo").with_changes(changes);

        assert_eq!(action.id, "replace-logo");
        assert_eq!(
            action.changed_field_summary(),
            vec!["name (update)".to_string(), "size (replace)".to_string()]
        );
    }
}
