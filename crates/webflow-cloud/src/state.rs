//! State model and persistence
//!
//! `DesiredState` is what the user declares for one object, `RecordedState`
//! is what was last observed after a successful create/update/read. The
//! `StateManager` persists recorded states in `.webflow/state.json`.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".webflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Declared configuration of a single managed object
///
/// Field names are the camelCase names used by the remote API. Values are
/// kept as JSON so every object kind can share the same diff engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredState {
    fields: BTreeMap<String, Value>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                fields: map.into_iter().collect(),
            }),
            Value::Null => Ok(Self::new()),
            other => Err(CloudError::InvalidConfig(format!(
                "resource properties must be a JSON object, got: {}",
                other
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Get a field as a specific type
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fields
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone().into_iter().collect())
    }
}

/// Last known state of a managed object
///
/// Holds the declared fields as they were last applied (or read back) next to
/// the outputs assigned by the remote system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedState {
    /// Declared fields as last applied or read back
    pub inputs: DesiredState,

    /// Remote-assigned values (IDs, timestamps, URLs)
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,

    /// When this record was produced
    pub recorded_at: DateTime<Utc>,
}

impl RecordedState {
    pub fn new(inputs: DesiredState) -> Self {
        Self {
            inputs,
            outputs: BTreeMap::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }

    pub fn set_output(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.outputs.insert(key.into(), value.into());
    }

    pub fn output(&self, key: &str) -> Option<&Value> {
        self.outputs.get(key)
    }

    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).and_then(Value::as_str)
    }
}

/// A persisted resource: kind, composite ID and its recorded state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Resource kind (e.g., "redirect", "robots-txt")
    pub kind: String,

    /// Composite resource ID used to address the remote object
    pub id: String,

    pub state: RecordedState,
}

impl ResourceEntry {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, state: RecordedState) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            state,
        }
    }
}

/// Contents of the state file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by logical name
    pub resources: BTreeMap<String, ResourceEntry>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get resources of a specific kind
    pub fn resources_of_kind(&self, kind: &str) -> Vec<(&String, &ResourceEntry)> {
        self.resources
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .collect()
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, name: impl Into<String>, entry: ResourceEntry) {
        self.resources.insert(name.into(), entry);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, name: &str) -> Option<ResourceEntry> {
        let result = self.resources.remove(name);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, name: &str) -> Option<&ResourceEntry> {
        self.resources.get(name)
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    /// Get the state file path
    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}. \
                 Upgrade the webflow CLI before touching this project",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than an hour are considered abandoned
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} since {}. Wait for the other run to finish \
                     or remove {} if it crashed",
                    lock_info.holder,
                    lock_info.acquired_at,
                    lock_path.display()
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn redirect_entry() -> ResourceEntry {
        let inputs = DesiredState::new()
            .with("siteId", "5f0c8c9e1c9d440000e8d8c3")
            .with("sourcePath", "/old")
            .with("destinationPath", "/new")
            .with("statusCode", 301);
        ResourceEntry::new(
            "redirect",
            "5f0c8c9e1c9d440000e8d8c3/redirects/abc",
            RecordedState::new(inputs).with_output("createdOn", "2025-01-01T00:00:00Z"),
        )
    }

    #[test]
    fn test_desired_state_from_value() {
        let state = DesiredState::from_value(json!({"name": "A", "size": 10})).unwrap();
        assert_eq!(state.get_str("name"), Some("A"));
        assert_eq!(state.get_as::<u32>("size"), Some(10));
        assert_eq!(state.len(), 2);

        assert!(DesiredState::from_value(Value::Null).unwrap().is_empty());
        assert!(matches!(
            DesiredState::from_value(json!([1, 2])),
            Err(CloudError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_recorded_state_serializes_inputs_flat() {
        let entry = redirect_entry();
        let value = serde_json::to_value(&entry.state).unwrap();
        assert_eq!(value["inputs"]["sourcePath"], json!("/old"));
        assert_eq!(value["outputs"]["createdOn"], json!("2025-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.set_resource("old-blog", redirect_entry());

        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        let entry = loaded.get_resource("old-blog").unwrap();
        assert_eq!(entry.kind, "redirect");
        assert_eq!(entry.state, state.get_resource("old-blog").unwrap().state);
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        manager.save(&GlobalState::new()).await.unwrap();
        manager.save(&GlobalState::new()).await.unwrap();

        assert!(temp_dir.path().join(".webflow/state.json.backup").exists());
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_newer_state_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.version = STATE_VERSION + 1;
        manager.save(&state).await.unwrap();

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, CloudError::StateError(_)));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(
            manager.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = manager.acquire_lock().await.unwrap();
        again.release().await.unwrap();
    }
}
