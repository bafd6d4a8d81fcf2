//! CMS collection items
//!
//! ID format: `{collectionId}/items/{itemId}`. Moving an item to another
//! collection is a replacement; everything else is patched in place.

use super::{required_str, validate_object_id};
use crate::client::WebflowClient;
use crate::transport::Method;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use webflow_cloud::resource_id::{self, ResourceId};
use webflow_cloud::{
    CloudError, Created, DesiredState, OpContext, RecordedState, Resource, ResourceSchema, Result,
};

pub const KIND: &str = "collection-item";
const SEGMENT: &str = "items";

/// Collection item as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    #[serde(default)]
    pub id: String,
    pub cms_locale_id: Option<String>,
    pub last_published: Option<String>,
    pub last_updated: Option<String>,
    pub created_on: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub field_data: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionItemRequest<'a> {
    field_data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cms_locale_id: Option<&'a str>,
}

impl<'a> CollectionItemRequest<'a> {
    fn from_desired(desired: &'a DesiredState) -> Result<Self> {
        let field_data = desired
            .get("fieldData")
            .ok_or_else(|| CloudError::Validation("fieldData is required".to_string()))?;
        Ok(Self {
            field_data,
            is_archived: desired.get("isArchived").and_then(Value::as_bool),
            is_draft: desired.get("isDraft").and_then(Value::as_bool),
            cms_locale_id: desired.get_str("cmsLocaleId"),
        })
    }
}

pub struct CollectionItemResource {
    client: Arc<WebflowClient>,
    schema: ResourceSchema,
}

impl CollectionItemResource {
    pub fn new(client: Arc<WebflowClient>) -> Self {
        Self {
            client,
            schema: ResourceSchema::new(KIND)
                .replace("collectionId")
                .update("fieldData")
                .update("isArchived")
                .update("isDraft")
                .update("cmsLocaleId")
                .output("itemId")
                .output("createdOn")
                .output("lastUpdated")
                .output("lastPublished"),
        }
    }

    /// Build the recorded state of `item`.
    ///
    /// With a prior state, only the `fieldData` keys that were declared are
    /// kept, so values the remote fills in on its own (a generated slug, for
    /// instance) never show up as drift.
    fn recorded(
        collection_id: &str,
        item: CollectionItem,
        prior: Option<&DesiredState>,
    ) -> RecordedState {
        let mut field_data = item.field_data;
        let mut cms_locale_id = item.cms_locale_id;

        if let Some(prior) = prior {
            if let Some(Value::Object(declared)) = prior.get("fieldData") {
                field_data.retain(|key, _| declared.contains_key(key));
            }
            if !prior.contains("cmsLocaleId") {
                cms_locale_id = None;
            }
        }

        let mut inputs = DesiredState::new()
            .with("collectionId", collection_id)
            .with("fieldData", Value::Object(field_data))
            .with("isArchived", item.is_archived)
            .with("isDraft", item.is_draft);
        if let Some(locale) = cms_locale_id {
            inputs.set("cmsLocaleId", locale);
        }

        let mut state = RecordedState::new(inputs).with_output("itemId", item.id);
        for (key, value) in [
            ("createdOn", item.created_on),
            ("lastUpdated", item.last_updated),
            ("lastPublished", item.last_published),
        ] {
            if let Some(value) = value {
                state.set_output(key, value);
            }
        }
        state
    }

    fn synthesized(&self, desired: &DesiredState, item_id: &str) -> RecordedState {
        let now = chrono::Utc::now().to_rfc3339();
        RecordedState::new(self.normalize(desired))
            .with_output("itemId", item_id)
            .with_output("createdOn", now.clone())
            .with_output("lastUpdated", now)
    }
}

#[async_trait]
impl Resource for CollectionItemResource {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn validate(&self, desired: &DesiredState) -> Result<()> {
        validate_object_id("collectionId", desired.get_str("collectionId"))?;
        match desired.get("fieldData") {
            Some(Value::Object(fields)) if !fields.is_empty() => Ok(()),
            _ => Err(CloudError::Validation(
                "fieldData is required but was not provided. Provide a map of field slugs to \
                 values (e.g., {\"name\": \"My Item\", \"slug\": \"my-item\"}) matching the \
                 collection schema"
                    .to_string(),
            )),
        }
    }

    fn normalize(&self, state: &DesiredState) -> DesiredState {
        let mut state = state.clone();
        for flag in ["isArchived", "isDraft"] {
            if state.get(flag).is_none_or(Value::is_null) {
                state.set(flag, false);
            }
        }
        state
    }

    async fn create(&self, desired: &DesiredState, ctx: &OpContext) -> Result<Created> {
        self.validate(desired)?;
        let collection_id = required_str(desired, "collectionId")?;

        if ctx.is_dry_run() {
            let id = ResourceId::preview(collection_id, SEGMENT);
            let state = self.synthesized(desired, id.object_id()?);
            return Ok(Created {
                id: id.to_string(),
                state,
            });
        }

        let request = CollectionItemRequest::from_desired(desired)?;
        let path = format!("/v2/collections/{}/items", collection_id);
        let item: CollectionItem = self
            .client
            .send_json(Method::POST, &path, &request, ctx.cancel_token())
            .await?;

        if item.id.is_empty() {
            return Err(CloudError::ApiError(
                "Webflow API returned an empty item ID; retry, and contact Webflow support \
                 if it keeps happening"
                    .to_string(),
            ));
        }

        tracing::info!(collection_id, item_id = %item.id, "Created collection item");
        let id = resource_id::encode(collection_id, SEGMENT, &item.id);
        Ok(Created {
            id,
            state: Self::recorded(collection_id, item, Some(&self.normalize(desired))),
        })
    }

    async fn read(
        &self,
        id: &str,
        prior: Option<&RecordedState>,
        ctx: &OpContext,
    ) -> Result<Option<RecordedState>> {
        let (collection_id, item_id) = resource_id::decode(id, SEGMENT)?;
        let path = format!("/v2/collections/{}/items/{}", collection_id, item_id);

        match self.client.get_json::<CollectionItem>(&path, ctx.cancel_token()).await {
            Ok(item) => Ok(Some(Self::recorded(
                &collection_id,
                item,
                prior.map(|p| &p.inputs),
            ))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        id: &str,
        desired: &DesiredState,
        prior: &RecordedState,
        ctx: &OpContext,
    ) -> Result<RecordedState> {
        self.validate(desired)?;
        let (collection_id, item_id) = resource_id::decode(id, SEGMENT)?;

        if ctx.is_dry_run() {
            let mut state = self.synthesized(desired, &item_id);
            if let Some(created) = prior.output("createdOn") {
                state.set_output("createdOn", created.clone());
            }
            return Ok(state);
        }

        let request = CollectionItemRequest::from_desired(desired)?;
        let path = format!("/v2/collections/{}/items/{}", collection_id, item_id);
        let item: CollectionItem = self
            .client
            .send_json(Method::PATCH, &path, &request, ctx.cancel_token())
            .await?;

        Ok(Self::recorded(&collection_id, item, Some(&self.normalize(desired))))
    }

    async fn delete(&self, id: &str, ctx: &OpContext) -> Result<()> {
        let parsed = ResourceId::parse(id, SEGMENT)?;
        if ctx.is_dry_run() || parsed.is_preview() {
            return Ok(());
        }

        let path = format!(
            "/v2/collections/{}/items/{}",
            parsed.parent(),
            parsed.object_id()?
        );
        self.client.delete(&path, ctx.cancel_token()).await?;
        tracing::info!(id, "Deleted collection item");
        Ok(())
    }
}
