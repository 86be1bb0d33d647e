// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! `cyberark_safe`: a PVWA safe with an optional initial member.
//!
//! The member is granted one of the fixed permission bundles of
//! [`PermissionLevel`]. With `enable_secrets_hub` set, the `SecretsHub`
//! service user is added too so sync policies can read the safe.

use async_trait::async_trait;
use cyberark::constants::{
    DEFAULT_MEMBER_TYPE, DEFAULT_RETENTION_DAYS, DEFAULT_SEARCH_IN, SECRETS_HUB_MEMBER,
};
use cyberark::models::{NewSafeMember, Safe, SafeRequest};
use cyberark::permissions::PERMISSION_LEVEL_NAMES;
use cyberark::{CyberArkClient, PermissionLevel};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::constants::{MAX_DESCRIPTION_LENGTH, MAX_RETENTION_DAYS, SAFE};
use crate::errors::ProviderError;
use crate::resources::{Resource, decode, merge_optional, string};
use crate::schema::{Attribute, AttributeType, Schema, object_mut};
use crate::validation::validate_safe_name;

const DEFAULT_PERMISSION_LEVEL: &str = "read";

#[derive(Debug, Clone, Deserialize, Validate)]
struct SafeModel {
    #[validate(custom(function = "validate_safe_name"))]
    safe_name: String,

    #[serde(default)]
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    description: Option<String>,

    #[serde(default)]
    managing_cpm: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = MAX_RETENTION_DAYS))]
    retention: Option<u32>,

    #[serde(default)]
    member: Option<String>,

    #[serde(default)]
    member_type: Option<String>,

    #[serde(default)]
    permission_level: Option<String>,

    #[serde(default)]
    search_in: Option<String>,

    #[serde(default)]
    enable_secrets_hub: Option<bool>,
}

impl SafeModel {
    fn request(&self) -> SafeRequest {
        SafeRequest {
            safe_name: self.safe_name.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            olac_enabled: false,
            managing_cpm: self.managing_cpm.clone().filter(|c| !c.is_empty()),
            number_of_days_retention: self.retention.unwrap_or(DEFAULT_RETENTION_DAYS),
        }
    }

    /// PUT keeps fields it does not receive, so clearing the description
    /// sends it empty.
    fn update_request(&self, prior: &Value) -> SafeRequest {
        let mut request = self.request();
        if request.description.is_none() && string(prior, "description").is_some() {
            request.description = Some(String::new());
        }
        request
    }

    fn permission_level(&self) -> Result<PermissionLevel, ProviderError> {
        self.permission_level
            .as_deref()
            .unwrap_or(DEFAULT_PERMISSION_LEVEL)
            .parse()
            .map_err(|e: cyberark::ApiError| ProviderError::ValidationError(e.to_string()))
    }

    fn member(&self) -> Result<Option<NewSafeMember>, ProviderError> {
        let Some(name) = self.member.as_deref().filter(|m| !m.is_empty()) else {
            return Ok(None);
        };
        let member = NewSafeMember::new(name, self.permission_level()?.permissions())
            .with_member_type(self.member_type.as_deref().unwrap_or(DEFAULT_MEMBER_TYPE))
            .with_search_in(self.search_in.as_deref().unwrap_or(DEFAULT_SEARCH_IN));
        Ok(Some(member))
    }
}

/// Safe URL id from state, falling back to the name for older states.
fn url_id(state: &Value) -> Result<String, ProviderError> {
    string(state, "safe_url_id")
        .or_else(|| string(state, "safe_name"))
        .ok_or_else(|| ProviderError::ValidationError("safe_name is required".to_string()))
}

fn apply(state: &mut Value, safe: &Safe) -> Result<(), ProviderError> {
    let object = object_mut(state)?;
    object.insert("id".to_string(), Value::from(safe.url_id()));
    object.insert("safe_url_id".to_string(), Value::from(safe.url_id()));
    object.insert("safe_name".to_string(), Value::from(safe.safe_name.as_str()));
    object.insert(
        "safe_number".to_string(),
        safe.safe_number.map(Value::from).unwrap_or(Value::Null),
    );
    merge_optional(object, "description", safe.description.as_deref());
    merge_optional(object, "managing_cpm", safe.managing_cpm.as_deref());
    if let Some(retention) = safe.number_of_days_retention {
        object.insert("retention".to_string(), Value::from(retention));
    }
    Ok(())
}

pub struct SafeResource;

#[async_trait]
impl Resource for SafeResource {
    fn type_name(&self) -> &'static str {
        SAFE
    }

    fn schema(&self) -> Schema {
        Schema::new("PVWA safe")
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute(
                "safe_name",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute("description", Attribute::optional(AttributeType::String))
            .attribute(
                "managing_cpm",
                Attribute::optional(AttributeType::String)
                    .describe("CPM user that manages accounts in the safe."),
            )
            .attribute(
                "retention",
                Attribute::optional(AttributeType::Number)
                    .with_default(DEFAULT_RETENTION_DAYS)
                    .describe("Days of retention for deleted object versions."),
            )
            .attribute(
                "member",
                Attribute::optional(AttributeType::String)
                    .force_new()
                    .describe("User or group added to the safe on creation."),
            )
            .attribute(
                "member_type",
                Attribute::optional(AttributeType::String)
                    .with_default(DEFAULT_MEMBER_TYPE)
                    .force_new(),
            )
            .attribute(
                "permission_level",
                Attribute::optional(AttributeType::String)
                    .with_default(DEFAULT_PERMISSION_LEVEL)
                    .force_new()
                    .describe(format!("One of: {}.", PERMISSION_LEVEL_NAMES.join(", "))),
            )
            .attribute(
                "search_in",
                Attribute::optional(AttributeType::String)
                    .with_default(DEFAULT_SEARCH_IN)
                    .force_new(),
            )
            .attribute(
                "enable_secrets_hub",
                Attribute::optional(AttributeType::Bool)
                    .with_default(false)
                    .force_new()
                    .describe("Add the SecretsHub service user to the safe."),
            )
            .attribute("safe_url_id", Attribute::computed(AttributeType::String))
            .attribute("safe_number", Attribute::computed(AttributeType::Number))
    }

    #[tracing::instrument(skip(self, client, planned))]
    async fn create(&self, client: &CyberArkClient, planned: Value) -> Result<Value, ProviderError> {
        let model: SafeModel = decode(&planned)?;
        // resolve the member before anything is created
        let member = model.member()?;

        let pam = client.pam();
        let safe = pam.create_safe(&model.request()).await?;

        if let Some(member) = member {
            pam.add_safe_member(safe.url_id(), &member).await?;
        }
        if model.enable_secrets_hub.unwrap_or(false) {
            let secrets_hub =
                NewSafeMember::new(SECRETS_HUB_MEMBER, PermissionLevel::SecretsHub.permissions());
            pam.add_safe_member(safe.url_id(), &secrets_hub).await?;
        }

        let mut state = planned;
        apply(&mut state, &safe)?;
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current))]
    async fn read(&self, client: &CyberArkClient, current: Value) -> Result<Option<Value>, ProviderError> {
        let id = url_id(&current)?;
        let Some(safe) = client.pam().get_safe(&id).await? else {
            tracing::warn!("[provider] safe {} no longer exists", id);
            return Ok(None);
        };

        let mut state = current;
        apply(&mut state, &safe)?;
        Ok(Some(state))
    }

    /// Only the safe's own settings change in place; member changes force a
    /// new safe.
    #[tracing::instrument(skip(self, client, prior, planned))]
    async fn update(
        &self,
        client: &CyberArkClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let model: SafeModel = decode(&planned)?;
        let id = url_id(&prior)?;
        let safe = client.pam().update_safe(&id, &model.update_request(&prior)).await?;

        let mut state = planned;
        apply(&mut state, &safe)?;
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current))]
    async fn delete(&self, client: &CyberArkClient, current: Value) -> Result<(), ProviderError> {
        client.pam().delete_safe(&url_id(&current)?).await?;
        Ok(())
    }

    /// Imports by safe name (or URL id).
    #[tracing::instrument(skip(self, client))]
    async fn import(&self, client: &CyberArkClient, id: &str) -> Result<Value, ProviderError> {
        let safe = client
            .pam()
            .get_safe(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("safe {id}")))?;

        let mut state = Value::Null;
        apply(&mut state, &safe)?;
        Ok(state)
    }
}
