//! Webflow provider: authentication check and the adapter registry

use crate::client::WebflowClient;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::resources::{CollectionItemResource, RedirectResource, RobotsTxtResource};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use webflow_cloud::{AuthStatus, ResourceRegistry};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizedTo {
    #[serde(default)]
    site_ids: Vec<String>,
    #[serde(default)]
    workspace_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Authorization {
    #[serde(default)]
    id: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    authorized_to: AuthorizedTo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Application {
    #[serde(default)]
    display_name: String,
}

/// Response of `GET /v2/token/introspect`
#[derive(Debug, Default, Deserialize)]
struct Introspection {
    #[serde(default)]
    authorization: Authorization,
    application: Option<Application>,
}

impl Introspection {
    fn account_info(&self) -> String {
        let auth = &self.authorization;
        let mut info = match self.application.as_ref().map(|a| a.display_name.as_str()) {
            Some(name) if !name.is_empty() => format!("{} ({})", name, auth.id),
            _ if !auth.id.is_empty() => format!("authorization {}", auth.id),
            _ => "Unknown".to_string(),
        };

        let sites = auth.authorized_to.site_ids.len();
        let workspaces = auth.authorized_to.workspace_ids.len();
        if sites > 0 || workspaces > 0 {
            info.push_str(&format!(", {} site(s), {} workspace(s)", sites, workspaces));
        }
        info
    }

    fn scopes(&self) -> Vec<String> {
        self.authorization
            .scope
            .split([',', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Webflow provider
#[derive(Clone)]
pub struct WebflowProvider {
    client: Arc<WebflowClient>,
}

impl WebflowProvider {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self::from_client(WebflowClient::new(config)?))
    }

    pub fn from_client(client: WebflowClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &WebflowClient {
        &self.client
    }

    /// Verify the token against the introspection endpoint.
    ///
    /// Rejections are reported in the returned status; only cancellation is
    /// an error.
    pub async fn check_auth(&self, cancel: &CancellationToken) -> Result<AuthStatus> {
        match self
            .client
            .get_json::<Introspection>("/v2/token/introspect", cancel)
            .await
        {
            Ok(introspection) => {
                Ok(AuthStatus::ok(introspection.account_info()).with_scopes(introspection.scopes()))
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    /// Registry with every supported resource kind
    pub fn registry(&self) -> ResourceRegistry {
        ResourceRegistry::new()
            .with(Arc::new(RedirectResource::new(self.client.clone())))
            .with(Arc::new(RobotsTxtResource::new(self.client.clone())))
            .with(Arc::new(CollectionItemResource::new(self.client.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspection_summary() {
        let introspection: Introspection = serde_json::from_str(
            r#"{
                "authorization": {
                    "id": "auth-1",
                    "scope": "sites:read,sites:write cms:write",
                    "authorizedTo": {"siteIds": ["a", "b"], "workspaceIds": [], "userIds": []}
                },
                "application": {"id": "app-1", "displayName": "Deployer"}
            }"#,
        )
        .unwrap();

        assert_eq!(introspection.account_info(), "Deployer (auth-1), 2 site(s), 0 workspace(s)");
        assert_eq!(
            introspection.scopes(),
            vec!["sites:read", "sites:write", "cms:write"]
        );
    }

    #[test]
    fn test_introspection_without_application() {
        let introspection: Introspection =
            serde_json::from_str(r#"{"authorization": {"id": "auth-2"}}"#).unwrap();
        assert_eq!(introspection.account_info(), "authorization auth-2");
        assert!(introspection.scopes().is_empty());
    }

    #[test]
    fn test_registry_kinds() {
        let client = WebflowClient::with_http_client(
            "http://127.0.0.1:9",
            "test-token-0123456789",
            reqwest::Client::new(),
        );
        let registry = WebflowProvider::from_client(client).registry();
        assert_eq!(registry.kinds(), vec!["collection-item", "redirect", "robots-txt"]);
    }
}
