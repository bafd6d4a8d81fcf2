//! Site robots.txt
//!
//! One per site, ID format: `{siteId}/robots.txt`. The API stores structured
//! rules; the declared `content` is plain robots.txt text and is converted in
//! both directions.

use super::{required_str, validate_object_id};
use crate::client::WebflowClient;
use crate::transport::Method;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use webflow_cloud::{
    CloudError, Created, DesiredState, OpContext, RecordedState, Resource, ResourceId,
    ResourceSchema, Result,
};

pub const KIND: &str = "robots-txt";
const SEGMENT: &str = "robots.txt";

/// Rules for one user agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsRule {
    pub user_agent: String,
    #[serde(default)]
    pub allows: Vec<String>,
    #[serde(default)]
    pub disallows: Vec<String>,
}

/// Structured robots.txt as exchanged with the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsTxt {
    #[serde(default)]
    pub rules: Vec<RobotsRule>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sitemap: String,
}

impl RobotsTxt {
    /// Parse robots.txt text. Directives are case-insensitive; Allow and
    /// Disallow lines before the first User-agent are ignored.
    pub fn parse(content: &str) -> Self {
        let mut robots = RobotsTxt::default();
        let mut current: Option<RobotsRule> = None;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match directive.trim().to_ascii_lowercase().as_str() {
                "sitemap" => robots.sitemap = value.to_string(),
                "user-agent" => {
                    if let Some(rule) = current.take() {
                        robots.rules.push(rule);
                    }
                    current = Some(RobotsRule {
                        user_agent: value.to_string(),
                        ..RobotsRule::default()
                    });
                }
                "allow" if !value.is_empty() => {
                    if let Some(rule) = current.as_mut() {
                        rule.allows.push(value.to_string());
                    }
                }
                "disallow" if !value.is_empty() => {
                    if let Some(rule) = current.as_mut() {
                        rule.disallows.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        if let Some(rule) = current {
            robots.rules.push(rule);
        }
        robots
    }

    /// Render as robots.txt text
    pub fn format(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&format!("User-agent: {}\n", rule.user_agent));
            for allow in &rule.allows {
                out.push_str(&format!("Allow: {}\n", allow));
            }
            for disallow in &rule.disallows {
                out.push_str(&format!("Disallow: {}\n", disallow));
            }
        }

        if !self.sitemap.is_empty() {
            if !self.rules.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("Sitemap: {}\n", self.sitemap));
        }
        out
    }
}

pub struct RobotsTxtResource {
    client: Arc<WebflowClient>,
    schema: ResourceSchema,
}

impl RobotsTxtResource {
    pub fn new(client: Arc<WebflowClient>) -> Self {
        Self {
            client,
            schema: ResourceSchema::new(KIND)
                .replace("siteId")
                .update("content")
                .output("lastModified"),
        }
    }

    fn recorded(site_id: &str, robots: &RobotsTxt) -> RecordedState {
        let inputs = DesiredState::new()
            .with("siteId", site_id)
            .with("content", robots.format());
        RecordedState::new(inputs).with_output("lastModified", chrono::Utc::now().to_rfc3339())
    }

    async fn put(&self, site_id: &str, content: &str, ctx: &OpContext) -> Result<RecordedState> {
        let robots = RobotsTxt::parse(content);
        let path = format!("/v2/sites/{}/robots_txt", site_id);
        let stored: RobotsTxt = self
            .client
            .send_json(Method::PUT, &path, &robots, ctx.cancel_token())
            .await?;
        Ok(Self::recorded(site_id, &stored))
    }

    fn synthesized(&self, desired: &DesiredState) -> RecordedState {
        RecordedState::new(self.normalize(desired))
            .with_output("lastModified", chrono::Utc::now().to_rfc3339())
    }
}

#[async_trait]
impl Resource for RobotsTxtResource {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn validate(&self, desired: &DesiredState) -> Result<()> {
        validate_object_id("siteId", desired.get_str("siteId"))?;
        match desired.get_str("content") {
            Some(content) if !content.trim().is_empty() => Ok(()),
            _ => Err(CloudError::Validation(
                "content is required but was not provided. Provide robots.txt content with at \
                 least one directive (e.g., 'User-agent: *\\nAllow: /')"
                    .to_string(),
            )),
        }
    }

    fn normalize(&self, state: &DesiredState) -> DesiredState {
        let mut state = state.clone();
        if let Some(content) = state.get_str("content") {
            let formatted = RobotsTxt::parse(content).format();
            state.set("content", formatted);
        }
        state
    }

    async fn create(&self, desired: &DesiredState, ctx: &OpContext) -> Result<Created> {
        self.validate(desired)?;
        let site_id = required_str(desired, "siteId")?;
        let id = ResourceId::singleton(site_id, SEGMENT).to_string();

        if ctx.is_dry_run() {
            return Ok(Created {
                id,
                state: self.synthesized(desired),
            });
        }

        let state = self.put(site_id, required_str(desired, "content")?, ctx).await?;
        tracing::info!(site_id, "Wrote robots.txt");
        Ok(Created { id, state })
    }

    async fn read(
        &self,
        id: &str,
        _prior: Option<&RecordedState>,
        ctx: &OpContext,
    ) -> Result<Option<RecordedState>> {
        let parsed = ResourceId::parse_singleton(id, SEGMENT)?;
        let path = format!("/v2/sites/{}/robots_txt", parsed.parent());

        match self.client.get_json::<RobotsTxt>(&path, ctx.cancel_token()).await {
            Ok(robots) => Ok(Some(Self::recorded(parsed.parent(), &robots))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        id: &str,
        desired: &DesiredState,
        _prior: &RecordedState,
        ctx: &OpContext,
    ) -> Result<RecordedState> {
        self.validate(desired)?;
        let parsed = ResourceId::parse_singleton(id, SEGMENT)?;

        if ctx.is_dry_run() {
            return Ok(self.synthesized(desired));
        }

        self.put(parsed.parent(), required_str(desired, "content")?, ctx)
            .await
    }

    async fn delete(&self, id: &str, ctx: &OpContext) -> Result<()> {
        let parsed = ResourceId::parse_singleton(id, SEGMENT)?;
        if ctx.is_dry_run() {
            return Ok(());
        }

        let path = format!("/v2/sites/{}/robots_txt", parsed.parent());
        self.client.delete(&path, ctx.cancel_token()).await?;
        tracing::info!(id, "Deleted robots.txt");
        Ok(())
    }
}
