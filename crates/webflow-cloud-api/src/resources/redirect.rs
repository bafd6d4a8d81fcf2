//! Site redirect rules
//!
//! ID format: `{siteId}/redirects/{redirectId}`.
//!
//! Every declared field triggers a replacement: the redirects endpoint
//! rejects in-place changes with 409, so a changed rule is deleted and
//! created again.

use super::{required_str, validate_object_id, validate_path};
use crate::client::WebflowClient;
use crate::transport::Method;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use webflow_cloud::resource_id::{self, ResourceId};
use webflow_cloud::{
    CloudError, Created, DesiredState, OpContext, RecordedState, Resource, ResourceSchema, Result,
};

pub const KIND: &str = "redirect";
const SEGMENT: &str = "redirects";
const DEFAULT_STATUS_CODE: u16 = 301;

/// Redirect rule as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "fromUrl")]
    pub source_path: String,
    #[serde(rename = "toUrl")]
    pub destination_path: String,
    /// Omitted by the list endpoint, in which case it decodes as 0
    #[serde(default)]
    pub status_code: u16,
}

#[derive(Debug, Deserialize)]
struct RedirectList {
    #[serde(default)]
    redirects: Vec<RedirectRule>,
}

#[derive(Debug, Serialize)]
struct RedirectRequest<'a> {
    #[serde(rename = "fromUrl", skip_serializing_if = "Option::is_none")]
    source_path: Option<&'a str>,
    #[serde(rename = "toUrl")]
    destination_path: &'a str,
    #[serde(rename = "statusCode")]
    status_code: u16,
}

pub struct RedirectResource {
    client: Arc<WebflowClient>,
    schema: ResourceSchema,
}

impl RedirectResource {
    pub fn new(client: Arc<WebflowClient>) -> Self {
        Self {
            client,
            schema: ResourceSchema::new(KIND)
                .replace("siteId")
                .replace("sourcePath")
                .replace("destinationPath")
                .replace("statusCode")
                .output("redirectId"),
        }
    }

    fn status_code(desired: &DesiredState) -> u16 {
        desired
            .get_as::<u16>("statusCode")
            .filter(|code| *code != 0)
            .unwrap_or(DEFAULT_STATUS_CODE)
    }

    fn recorded(site_id: &str, rule: &RedirectRule, status_code: u16) -> RecordedState {
        let inputs = DesiredState::new()
            .with("siteId", site_id)
            .with("sourcePath", rule.source_path.as_str())
            .with("destinationPath", rule.destination_path.as_str())
            .with("statusCode", status_code);
        RecordedState::new(inputs).with_output("redirectId", rule.id.as_str())
    }

    /// List every redirect of a site
    pub async fn list(&self, site_id: &str, ctx: &OpContext) -> Result<Vec<RedirectRule>> {
        let path = format!("/v2/sites/{}/redirects", site_id);
        let list: RedirectList = self.client.get_json(&path, ctx.cancel_token()).await?;
        Ok(list.redirects)
    }
}

#[async_trait]
impl Resource for RedirectResource {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn validate(&self, desired: &DesiredState) -> Result<()> {
        validate_object_id("siteId", desired.get_str("siteId"))?;
        validate_path("sourcePath", desired.get_str("sourcePath"))?;
        validate_path("destinationPath", desired.get_str("destinationPath"))?;

        if let Some(value) = desired.get("statusCode").filter(|v| !v.is_null()) {
            match value.as_u64() {
                Some(301) | Some(302) => {}
                _ => {
                    return Err(CloudError::Validation(format!(
                        "statusCode must be either 301 or 302: got {}. \
                         301 = permanent redirect, 302 = temporary redirect",
                        value
                    )));
                }
            }
        }
        Ok(())
    }

    fn normalize(&self, state: &DesiredState) -> DesiredState {
        let mut state = state.clone();
        state.set("statusCode", Self::status_code(&state));
        state
    }

    async fn create(&self, desired: &DesiredState, ctx: &OpContext) -> Result<Created> {
        self.validate(desired)?;
        let site_id = required_str(desired, "siteId")?;
        let desired = self.normalize(desired);

        if ctx.is_dry_run() {
            let id = ResourceId::preview(site_id, SEGMENT);
            let redirect_id = id.object_id()?.to_string();
            return Ok(Created {
                id: id.to_string(),
                state: RecordedState::new(desired).with_output("redirectId", redirect_id),
            });
        }

        let request = RedirectRequest {
            source_path: Some(required_str(&desired, "sourcePath")?),
            destination_path: required_str(&desired, "destinationPath")?,
            status_code: Self::status_code(&desired),
        };
        let path = format!("/v2/sites/{}/redirects", site_id);
        let rule: RedirectRule = self
            .client
            .send_json(Method::POST, &path, &request, ctx.cancel_token())
            .await?;

        if rule.id.is_empty() {
            return Err(CloudError::ApiError(
                "Webflow API returned an empty redirect ID; retry, and contact Webflow support \
                 if it keeps happening"
                    .to_string(),
            ));
        }

        tracing::info!(site_id, redirect_id = %rule.id, "Created redirect");
        Ok(Created {
            id: resource_id::encode(site_id, SEGMENT, &rule.id),
            state: Self::recorded(site_id, &rule, request.status_code),
        })
    }

    async fn read(
        &self,
        id: &str,
        prior: Option<&RecordedState>,
        ctx: &OpContext,
    ) -> Result<Option<RecordedState>> {
        let (site_id, redirect_id) = resource_id::decode(id, SEGMENT)?;

        let rules = match self.list(&site_id, ctx).await {
            Ok(rules) => rules,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(rule) = rules.into_iter().find(|r| r.id == redirect_id) else {
            tracing::debug!(id, "Redirect no longer exists");
            return Ok(None);
        };

        let status_code = match rule.status_code {
            0 => prior
                .map(|p| Self::status_code(&p.inputs))
                .unwrap_or(DEFAULT_STATUS_CODE),
            code => code,
        };
        Ok(Some(Self::recorded(&site_id, &rule, status_code)))
    }

    async fn update(
        &self,
        id: &str,
        desired: &DesiredState,
        prior: &RecordedState,
        ctx: &OpContext,
    ) -> Result<RecordedState> {
        self.validate(desired)?;
        let (site_id, redirect_id) = resource_id::decode(id, SEGMENT)?;
        let desired = self.normalize(desired);

        if ctx.is_dry_run() {
            let mut state = RecordedState::new(desired);
            state.outputs = prior.outputs.clone();
            return Ok(state);
        }

        let request = RedirectRequest {
            source_path: None,
            destination_path: required_str(&desired, "destinationPath")?,
            status_code: Self::status_code(&desired),
        };
        let path = format!("/v2/sites/{}/redirects/{}", site_id, redirect_id);
        let rule: RedirectRule = self
            .client
            .send_json(Method::PATCH, &path, &request, ctx.cancel_token())
            .await?;

        Ok(Self::recorded(&site_id, &rule, request.status_code))
    }

    async fn delete(&self, id: &str, ctx: &OpContext) -> Result<()> {
        let parsed = ResourceId::parse(id, SEGMENT)?;
        if ctx.is_dry_run() || parsed.is_preview() {
            return Ok(());
        }

        let path = format!(
            "/v2/sites/{}/redirects/{}",
            parsed.parent(),
            parsed.object_id()?
        );
        self.client.delete(&path, ctx.cancel_token()).await?;
        tracing::info!(id, "Deleted redirect");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webflow_cloud::{ActionType, FieldChange};

    const SITE: &str = "5f0c8c9e1c9d440000e8d8c3";

    fn resource() -> RedirectResource {
        // never contacted: tests below stay offline
        let client = WebflowClient::with_http_client(
            "http://127.0.0.1:9",
            "test-token-0123456789",
            reqwest::Client::new(),
        );
        RedirectResource::new(Arc::new(client))
    }

    fn desired() -> DesiredState {
        DesiredState::new()
            .with("siteId", SITE)
            .with("sourcePath", "/old")
            .with("destinationPath", "/new")
            .with("statusCode", 301)
    }

    #[test]
    fn test_validate() {
        let r = resource();
        assert!(r.validate(&desired()).is_ok());

        let err = r.validate(&desired().with("statusCode", 307)).unwrap_err();
        assert!(err.to_string().contains("301 or 302"));

        assert!(r.validate(&desired().with("sourcePath", "old")).is_err());
        assert!(r.validate(&desired().with("siteId", "nope")).is_err());
    }

    #[test]
    fn test_every_field_replaces() {
        let r = resource();
        let prior = RecordedState::new(desired());

        let changes = r.diff(&desired().with("destinationPath", "/newer"), &prior);
        assert_eq!(changes.get("destinationPath"), FieldChange::Replace);
        assert_eq!(changes.action(), ActionType::Replace);
    }

    #[test]
    fn test_missing_status_code_defaults_to_permanent() {
        let r = resource();
        let mut without = desired();
        without.remove("statusCode");

        let prior = RecordedState::new(desired());
        assert!(!r.diff(&without, &prior).has_changes());
    }

    #[tokio::test]
    async fn test_dry_run_create_makes_no_call() {
        let r = resource();
        let ctx = OpContext::new().with_dry_run(true);

        let created = r.create(&desired(), &ctx).await.unwrap();
        assert!(created.id.starts_with(&format!("{}/redirects/preview-", SITE)));
        assert!(
            created
                .state
                .output_str("redirectId")
                .unwrap()
                .starts_with("preview-")
        );

        r.delete(&created.id, &OpContext::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_before_network() {
        let r = resource();
        let err = r
            .create(&desired().with("destinationPath", ""), &OpContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Validation(_)));
    }
}
