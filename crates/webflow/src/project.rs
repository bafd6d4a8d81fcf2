//! Project context shared by the commands: desired-state file, state
//! directory and the Webflow provider

use anyhow::Context;
use std::path::{Path, PathBuf};
use webflow_cloud::{Reconciler, ResourceSet, StateManager};
use webflow_cloud_api::{ApiConfig, WebflowProvider};

pub struct Project {
    pub file: PathBuf,
    pub state: StateManager,
    pub provider: WebflowProvider,
}

impl Project {
    /// State lives next to the desired-state file, under `.webflow/`
    ///
    /// Without an explicit token the configuration is read from the
    /// environment.
    pub fn open(file: &Path, token: Option<&str>, base_url: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match token.filter(|t| !t.is_empty()) {
            Some(token) => ApiConfig::new(token)?,
            None => ApiConfig::from_env().context(
                "No Webflow API token. Set WEBFLOW_API_TOKEN or pass --token \
                 (create one under Site settings > Apps & integrations > API access)",
            )?,
        };
        if let Some(base_url) = base_url.filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(base_url)?;
        }

        let root = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            file: file.to_path_buf(),
            state: StateManager::new(root),
            provider: WebflowProvider::new(&config)?,
        })
    }

    pub fn load_desired(&self) -> anyhow::Result<ResourceSet> {
        let content = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        ResourceSet::from_json(&content)
            .with_context(|| format!("Invalid desired-state file {}", self.file.display()))
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.provider.registry())
    }
}
