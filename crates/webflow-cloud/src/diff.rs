//! Per-field diff between desired and recorded state
//!
//! Every field of a resource kind is declared with a [`Mutability`] in its
//! [`ResourceSchema`]. The diff never infers mutability from values: a
//! changed `Replace` field forces destroy-then-recreate, a changed `Update`
//! field is applied in place, and `Output` fields are never compared.

use crate::action::ActionType;
use crate::state::{DesiredState, RecordedState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// How a change to a field can be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Changing the field requires destroy + recreate
    Replace,
    /// Changing the field can be applied in place
    Update,
    /// Populated by the remote system only, excluded from diffing
    Output,
}

/// Declared fields of one resource kind
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    kind: String,
    fields: Vec<(String, Mutability)>,
}

impl ResourceSchema {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a replace-triggering field
    pub fn replace(self, name: impl Into<String>) -> Self {
        self.field(name, Mutability::Replace)
    }

    /// Declare an update-compatible field
    pub fn update(self, name: impl Into<String>) -> Self {
        self.field(name, Mutability::Update)
    }

    /// Declare a read-only output field
    pub fn output(self, name: impl Into<String>) -> Self {
        self.field(name, Mutability::Output)
    }

    pub fn field(mut self, name: impl Into<String>, mutability: Mutability) -> Self {
        let name = name.into();
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, mutability));
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Declared mutability of a field. Undeclared fields are update-compatible.
    pub fn mutability(&self, name: &str) -> Mutability {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| *m)
            .unwrap_or(Mutability::Update)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

/// Classification of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChange {
    Unchanged,
    Update,
    Replace,
}

/// How far the diff goes once a replacement is certain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Report every differing field
    #[default]
    Exhaustive,
    /// Stop at the first differing replace-triggering field.
    ///
    /// Only the first such field is reported; kept for callers that expect
    /// a single flagged field when a replacement is already decided.
    FirstReplace,
}

/// Result of diffing one object
///
/// Only changed fields are stored; the derived flags are computed from them,
/// so `requires_replace` and `has_changes` can never disagree with the
/// per-field tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    fields: BTreeMap<String, FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field classification. `Unchanged` entries are not stored.
    pub fn insert(&mut self, field: impl Into<String>, change: FieldChange) {
        let field = field.into();
        match change {
            FieldChange::Unchanged => {
                self.fields.remove(&field);
            }
            _ => {
                self.fields.insert(field, change);
            }
        }
    }

    /// Classification of a field; fields never reported are unchanged
    pub fn get(&self, field: &str) -> FieldChange {
        self.fields
            .get(field)
            .copied()
            .unwrap_or(FieldChange::Unchanged)
    }

    pub fn has_changes(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        self.fields.values().any(|c| *c == FieldChange::Replace)
    }

    /// Changed fields in name order
    pub fn changed_fields(&self) -> impl Iterator<Item = (&str, FieldChange)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names of fields that force a replacement
    pub fn replace_fields(&self) -> Vec<&str> {
        self.changed_fields()
            .filter(|(_, c)| *c == FieldChange::Replace)
            .map(|(k, _)| k)
            .collect()
    }

    /// Overall action implied by this change set
    pub fn action(&self) -> ActionType {
        if self.requires_replace() {
            ActionType::Replace
        } else if self.has_changes() {
            ActionType::Update
        } else {
            ActionType::NoOp
        }
    }
}

/// Diff a desired state against the declared half of a recorded state
pub fn diff(
    schema: &ResourceSchema,
    desired: &DesiredState,
    recorded: &RecordedState,
    mode: DiffMode,
) -> ChangeSet {
    diff_inputs(schema, desired, &recorded.inputs, mode)
}

/// Diff two declared states field by field
///
/// Fields are visited in schema declaration order, then any undeclared field
/// names in lexical order, so `DiffMode::FirstReplace` is deterministic.
pub fn diff_inputs(
    schema: &ResourceSchema,
    desired: &DesiredState,
    recorded: &DesiredState,
    mode: DiffMode,
) -> ChangeSet {
    let mut changes = ChangeSet::new();

    let declared: Vec<&str> = schema.field_names().collect();
    let undeclared: BTreeSet<&str> = desired
        .keys()
        .chain(recorded.keys())
        .filter(|k| !declared.contains(k))
        .collect();

    for name in declared.iter().copied().chain(undeclared) {
        let mutability = schema.mutability(name);
        if mutability == Mutability::Output {
            continue;
        }
        if values_equal(desired.get(name), recorded.get(name)) {
            continue;
        }

        match mutability {
            Mutability::Replace => {
                changes.insert(name, FieldChange::Replace);
                if mode == DiffMode::FirstReplace {
                    tracing::debug!(
                        kind = schema.kind(),
                        field = name,
                        "Replacement decided, skipping remaining fields"
                    );
                    return changes;
                }
            }
            Mutability::Update => changes.insert(name, FieldChange::Update),
            Mutability::Output => {}
        }
    }

    changes
}

/// JSON equality where a missing value and `null` are the same, and numbers
/// compare by value (`301` equals `301.0`)
fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (Some(a), Some(b)) => json_equal(a, b),
        _ => false,
    }
}

fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => xs
            .keys()
            .chain(ys.keys())
            .all(|k| values_equal(xs.get(k), ys.get(k))),
        _ => a == b,
    }
}
