//! Plan/refresh/apply over the registered resource kinds

use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::error::{CloudError, Result};
use crate::resource::{OpContext, Resource, ResourceConfig, ResourceSet};
use crate::state::{GlobalState, ResourceEntry};
use std::collections::HashMap;
use std::sync::Arc;

/// Resource kinds known to the reconciler, indexed by kind name
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    kinds: HashMap<String, Arc<dyn Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: Arc<dyn Resource>) {
        self.kinds.insert(resource.kind().to_string(), resource);
    }

    pub fn with(mut self, resource: Arc<dyn Resource>) -> Self {
        self.register(resource);
        self
    }

    pub fn get(&self, kind: &str) -> Result<&Arc<dyn Resource>> {
        self.kinds.get(kind).ok_or_else(|| {
            let mut known: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
            known.sort_unstable();
            CloudError::UnknownResourceKind(format!(
                "'{}' (supported kinds: {})",
                kind,
                known.join(", ")
            ))
        })
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

/// Outcome of re-reading every recorded resource
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Resources whose recorded state was replaced by a fresh read
    pub refreshed: Vec<String>,

    /// Resources deleted out of band and dropped from state
    pub removed: Vec<String>,
}

pub struct Reconciler {
    registry: ResourceRegistry,
}

impl Reconciler {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Compare the desired resources with recorded state.
    ///
    /// Every desired resource is validated before anything else happens, so
    /// a bad input never produces a partial plan.
    pub fn plan(&self, desired: &ResourceSet, state: &GlobalState) -> Result<Plan> {
        let mut actions = Vec::new();

        for config in desired.iter() {
            let resource = self.registry.get(&config.kind)?;
            resource.validate(&config.properties).map_err(|e| match e {
                CloudError::Validation(msg) => {
                    CloudError::Validation(format!("{} '{}': {}", config.kind, config.name, msg))
                }
                other => other,
            })?;
        }

        for config in desired.iter() {
            let resource = self.registry.get(&config.kind)?;

            let action = match state.get_resource(&config.name) {
                None => Action::new(ActionType::Create, &config.kind, &config.name),
                Some(entry) if entry.kind != config.kind => {
                    Action::new(ActionType::Replace, &config.kind, &config.name)
                        .with_remote_id(&entry.id)
                        .with_description(format!(
                            "replace {} {} with {} {}",
                            entry.kind, config.name, config.kind, config.name
                        ))
                        .with_detail("previousKind", serde_json::json!(entry.kind))
                }
                Some(entry) => {
                    let changes = resource.diff(&config.properties, &entry.state);
                    Action::new(changes.action(), &config.kind, &config.name)
                        .with_remote_id(&entry.id)
                        .with_changes(changes)
                }
            };

            tracing::debug!(
                name = %config.name,
                kind = %config.kind,
                action = %action.action_type,
                "Planned resource"
            );
            actions.push(action);
        }

        for (name, entry) in &state.resources {
            if desired.get(name).is_none() {
                actions.push(
                    Action::new(ActionType::Delete, &entry.kind, name).with_remote_id(&entry.id),
                );
            }
        }

        Ok(Plan::new(actions))
    }

    /// Plan deletion of every recorded resource
    pub fn plan_destroy(&self, state: &GlobalState) -> Plan {
        Plan::new(
            state
                .resources
                .iter()
                .map(|(name, entry)| {
                    Action::new(ActionType::Delete, &entry.kind, name).with_remote_id(&entry.id)
                })
                .collect(),
        )
    }

    /// Re-read every recorded resource; drop the ones that are gone
    pub async fn refresh(&self, state: &mut GlobalState, ctx: &OpContext) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();
        let names: Vec<String> = state.resources.keys().cloned().collect();

        for name in names {
            if ctx.is_cancelled() {
                return Err(CloudError::Cancelled("refresh".to_string()));
            }
            let Some(entry) = state.get_resource(&name) else {
                continue;
            };
            let resource = self.registry.get(&entry.kind)?;

            match resource.read(&entry.id, Some(&entry.state), ctx).await? {
                Some(fresh) => {
                    let entry = ResourceEntry::new(entry.kind.clone(), entry.id.clone(), fresh);
                    state.set_resource(name.clone(), entry);
                    report.refreshed.push(name);
                }
                None => {
                    tracing::warn!(name = %name, "Resource was deleted outside of webflow, dropping it from state");
                    state.remove_resource(&name);
                    report.removed.push(name);
                }
            }
        }

        Ok(report)
    }

    /// Execute a plan, recording every successful step in `state`.
    ///
    /// A failed action does not stop the run. Cancellation does: the current
    /// and every remaining action are reported as failed.
    pub async fn apply(
        &self,
        plan: &Plan,
        desired: &ResourceSet,
        state: &mut GlobalState,
        ctx: &OpContext,
    ) -> ApplyResult {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                continue;
            }
            if ctx.is_cancelled() {
                result.add_failure(action.id.clone(), "cancelled before start".to_string());
                continue;
            }

            match self.apply_action(action, desired, state, ctx).await {
                Ok(message) => {
                    tracing::info!(action = %action.id, "{}", message);
                    result.add_success(action.id.clone(), message);
                }
                Err(e) => {
                    tracing::warn!(action = %action.id, error = %e, "Action failed");
                    result.add_failure(action.id.clone(), e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn apply_action(
        &self,
        action: &Action,
        desired: &ResourceSet,
        state: &mut GlobalState,
        ctx: &OpContext,
    ) -> Result<String> {
        let name = &action.resource_name;

        match action.action_type {
            ActionType::Create => {
                let config = desired_config(desired, name)?;
                let id = self.create(config, state, ctx).await?;
                Ok(format!("created {} {} ({})", config.kind, name, id))
            }
            ActionType::Update => {
                let config = desired_config(desired, name)?;
                let entry = recorded_entry(state, name)?;
                let resource = self.registry.get(&config.kind)?;
                let fresh = resource
                    .update(&entry.id, &config.properties, &entry.state, ctx)
                    .await?;
                let id = entry.id.clone();
                state.set_resource(name, ResourceEntry::new(&config.kind, &id, fresh));
                Ok(format!("updated {} {} ({})", config.kind, name, id))
            }
            ActionType::Replace => {
                let config = desired_config(desired, name)?;
                self.delete(name, state, ctx).await?;
                let id = self.create(config, state, ctx).await?;
                Ok(format!("replaced {} {} ({})", config.kind, name, id))
            }
            ActionType::Delete => {
                let entry = self.delete(name, state, ctx).await?;
                Ok(format!("deleted {} {} ({})", entry.kind, name, entry.id))
            }
            ActionType::NoOp => Ok(format!("{} unchanged", name)),
        }
    }

    async fn create(
        &self,
        config: &ResourceConfig,
        state: &mut GlobalState,
        ctx: &OpContext,
    ) -> Result<String> {
        let resource = self.registry.get(&config.kind)?;
        let created = resource.create(&config.properties, ctx).await?;
        state.set_resource(
            &config.name,
            ResourceEntry::new(&config.kind, &created.id, created.state),
        );
        Ok(created.id)
    }

    async fn delete(
        &self,
        name: &str,
        state: &mut GlobalState,
        ctx: &OpContext,
    ) -> Result<ResourceEntry> {
        let entry = recorded_entry(state, name)?;
        let resource = self.registry.get(&entry.kind)?;
        resource.delete(&entry.id, ctx).await?;
        state
            .remove_resource(name)
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))
    }
}

fn desired_config<'a>(desired: &'a ResourceSet, name: &str) -> Result<&'a ResourceConfig> {
    desired.get(name).ok_or_else(|| {
        CloudError::InvalidConfig(format!(
            "'{}' is not declared in the desired state; re-run plan",
            name
        ))
    })
}

fn recorded_entry<'a>(state: &'a GlobalState, name: &str) -> Result<&'a ResourceEntry> {
    state.get_resource(name).ok_or_else(|| {
        CloudError::ResourceNotFound(format!("'{}' has no recorded state; re-run plan", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{FieldChange, ResourceSchema};
    use crate::resource::Created;
    use crate::resource_id::{self, ResourceId};
    use crate::state::{DesiredState, RecordedState};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    /// In-memory kind with `parentFolder` replace-triggering and `name` updatable
    struct MemoryResource {
        schema: ResourceSchema,
        objects: Mutex<HashMap<String, DesiredState>>,
        next_id: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    impl MemoryResource {
        fn new() -> Self {
            Self {
                schema: ResourceSchema::new("folder-item")
                    .replace("parentFolder")
                    .update("name")
                    .output("createdOn"),
                objects: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Resource for MemoryResource {
        fn kind(&self) -> &str {
            "folder-item"
        }

        fn schema(&self) -> &ResourceSchema {
            &self.schema
        }

        fn validate(&self, desired: &DesiredState) -> Result<()> {
            match desired.get_str("name") {
                Some(name) if !name.is_empty() => Ok(()),
                _ => Err(CloudError::Validation("name is required".to_string())),
            }
        }

        async fn create(&self, desired: &DesiredState, ctx: &OpContext) -> Result<Created> {
            let parent = desired.get_str("parentFolder").unwrap_or("root");
            if ctx.is_dry_run() {
                return Ok(Created {
                    id: ResourceId::preview(parent, "items").to_string(),
                    state: RecordedState::new(desired.clone()),
                });
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            let id = resource_id::encode(parent, "items", &n.to_string());
            self.objects
                .lock()
                .unwrap()
                .insert(id.clone(), desired.clone());
            self.log(format!("create {}", id));
            Ok(Created {
                id,
                state: RecordedState::new(desired.clone()).with_output("createdOn", "now"),
            })
        }

        async fn read(
            &self,
            id: &str,
            _prior: Option<&RecordedState>,
            _ctx: &OpContext,
        ) -> Result<Option<RecordedState>> {
            self.log(format!("read {}", id));
            Ok(self
                .objects
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .map(RecordedState::new))
        }

        async fn update(
            &self,
            id: &str,
            desired: &DesiredState,
            _prior: &RecordedState,
            _ctx: &OpContext,
        ) -> Result<RecordedState> {
            self.log(format!("update {}", id));
            self.objects
                .lock()
                .unwrap()
                .insert(id.to_string(), desired.clone());
            Ok(RecordedState::new(desired.clone()))
        }

        async fn delete(&self, id: &str, _ctx: &OpContext) -> Result<()> {
            self.log(format!("delete {}", id));
            self.objects.lock().unwrap().remove(id);
            Ok(())
        }
    }

    fn setup() -> (Arc<MemoryResource>, Reconciler) {
        let resource = Arc::new(MemoryResource::new());
        let registry = ResourceRegistry::new().with(resource.clone());
        (resource, Reconciler::new(registry))
    }

    fn desired(name: &str, props: DesiredState) -> ResourceSet {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new(name, "folder-item", props));
        set
    }

    fn props(name: &str, folder: &str) -> DesiredState {
        DesiredState::new()
            .with("name", name)
            .with("parentFolder", folder)
    }

    #[tokio::test]
    async fn test_create_then_noop() {
        let (resource, reconciler) = setup();
        let ctx = OpContext::new();
        let mut state = GlobalState::new();
        let set = desired("logo", props("A", "f1"));

        let plan = reconciler.plan(&set, &state).unwrap();
        assert_eq!(plan.summary().create, 1);

        let result = reconciler.apply(&plan, &set, &mut state, &ctx).await;
        assert!(result.is_success());
        assert_eq!(state.get_resource("logo").unwrap().id, "f1/items/1");

        let plan = reconciler.plan(&set, &state).unwrap();
        assert!(!plan.has_changes);
        assert_eq!(resource.calls(), vec!["create f1/items/1".to_string()]);
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let (resource, reconciler) = setup();
        let ctx = OpContext::new();
        let mut state = GlobalState::new();

        let set = desired("logo", props("A", "f1"));
        let plan = reconciler.plan(&set, &state).unwrap();
        reconciler.apply(&plan, &set, &mut state, &ctx).await;

        let set = desired("logo", props("B", "f1"));
        let plan = reconciler.plan(&set, &state).unwrap();
        let action = &plan.actions[0];
        assert_eq!(action.action_type, ActionType::Update);
        assert_eq!(action.changes.get("name"), FieldChange::Update);

        let result = reconciler.apply(&plan, &set, &mut state, &ctx).await;
        assert!(result.is_success());
        assert_eq!(
            resource.calls().last().map(String::as_str),
            Some("update f1/items/1")
        );
        let entry = state.get_resource("logo").unwrap();
        assert_eq!(entry.state.inputs.get_str("name"), Some("B"));
    }

    #[tokio::test]
    async fn test_replace_deletes_before_create() {
        let (resource, reconciler) = setup();
        let ctx = OpContext::new();
        let mut state = GlobalState::new();

        let set = desired("logo", props("A", "f1"));
        let plan = reconciler.plan(&set, &state).unwrap();
        reconciler.apply(&plan, &set, &mut state, &ctx).await;

        let set = desired("logo", props("B", "f2"));
        let plan = reconciler.plan(&set, &state).unwrap();
        let action = &plan.actions[0];
        assert_eq!(action.action_type, ActionType::Replace);
        assert!(action.changes.requires_replace());
        assert_eq!(action.changes.get("name"), FieldChange::Update);

        let result = reconciler.apply(&plan, &set, &mut state, &ctx).await;
        assert!(result.is_success());
        assert_eq!(
            resource.calls(),
            vec![
                "create f1/items/1".to_string(),
                "delete f1/items/1".to_string(),
                "create f2/items/2".to_string(),
            ]
        );
        assert_eq!(state.get_resource("logo").unwrap().id, "f2/items/2");
    }

    #[tokio::test]
    async fn test_orphans_are_deleted() {
        let (_resource, reconciler) = setup();
        let ctx = OpContext::new();
        let mut state = GlobalState::new();

        let set = desired("logo", props("A", "f1"));
        let plan = reconciler.plan(&set, &state).unwrap();
        reconciler.apply(&plan, &set, &mut state, &ctx).await;

        let empty = ResourceSet::new();
        let plan = reconciler.plan(&empty, &state).unwrap();
        assert_eq!(plan.summary().delete, 1);
        assert_eq!(plan.actions[0].remote_id.as_deref(), Some("f1/items/1"));

        let result = reconciler.apply(&plan, &empty, &mut state, &ctx).await;
        assert!(result.is_success());
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_plan_destroy_covers_every_entry() {
        let (_resource, reconciler) = setup();
        let mut state = GlobalState::new();
        for (name, id) in [("a", "f/items/1"), ("b", "f/items/2")] {
            state.set_resource(
                name,
                ResourceEntry::new("folder-item", id, RecordedState::new(props(name, "f"))),
            );
        }

        let plan = reconciler.plan_destroy(&state);
        assert_eq!(plan.summary().delete, 2);
    }

    #[tokio::test]
    async fn test_validation_blocks_whole_plan() {
        let (resource, reconciler) = setup();
        let mut set = desired("ok", props("A", "f1"));
        set.add(ResourceConfig::new(
            "bad",
            "folder-item",
            DesiredState::new().with("parentFolder", "f1"),
        ));

        let err = reconciler.plan(&set, &GlobalState::new()).unwrap_err();
        assert!(matches!(err, CloudError::Validation(_)));
        assert!(err.to_string().contains("folder-item 'bad'"));
        assert!(resource.calls().is_empty());
    }

    #[test]
    fn test_unknown_kind() {
        let (_resource, reconciler) = setup();
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new("x", "webhook", DesiredState::new()));

        let err = reconciler.plan(&set, &GlobalState::new()).unwrap_err();
        assert!(matches!(err, CloudError::UnknownResourceKind(_)));
        assert!(err.to_string().contains("folder-item"));
    }

    #[tokio::test]
    async fn test_refresh_drops_deleted_resources() {
        let (resource, reconciler) = setup();
        let ctx = OpContext::new();
        let mut state = GlobalState::new();

        let set = desired("logo", props("A", "f1"));
        let plan = reconciler.plan(&set, &state).unwrap();
        reconciler.apply(&plan, &set, &mut state, &ctx).await;

        resource.objects.lock().unwrap().clear();

        let report = reconciler.refresh(&mut state, &ctx).await.unwrap();
        assert_eq!(report.removed, vec!["logo".to_string()]);
        assert!(state.resources.is_empty());

        // next plan recreates it
        let plan = reconciler.plan(&set, &state).unwrap();
        assert_eq!(plan.summary().create, 1);
    }

    #[tokio::test]
    async fn test_dry_run_synthesizes_preview_ids() {
        let (resource, reconciler) = setup();
        let ctx = OpContext::new().with_dry_run(true);
        let mut state = GlobalState::new();
        let set = desired("logo", props("A", "f1"));

        let plan = reconciler.plan(&set, &state).unwrap();
        let result = reconciler.apply(&plan, &set, &mut state, &ctx).await;

        assert!(result.is_success());
        let id = &state.get_resource("logo").unwrap().id;
        assert!(id.starts_with("f1/items/preview-"));
        assert!(resource.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_apply_runs_nothing() {
        let (resource, reconciler) = setup();
        let token = CancellationToken::new();
        let ctx = OpContext::new().with_cancel(token.clone());
        let mut state = GlobalState::new();
        let set = desired("logo", props("A", "f1"));

        let plan = reconciler.plan(&set, &state).unwrap();
        token.cancel();
        let result = reconciler.apply(&plan, &set, &mut state, &ctx).await;

        assert!(!result.is_success());
        assert_eq!(result.failed.len(), 1);
        assert!(resource.calls().is_empty());
        assert!(state.resources.is_empty());
    }
}
