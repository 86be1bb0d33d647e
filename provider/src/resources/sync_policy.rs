// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! `cyberark_sync_policy`: syncs the secrets of one PAM safe from a source
//! store to a target store.

use std::str::FromStr;

use async_trait::async_trait;
use cyberark::CyberArkClient;
use cyberark::constants::DEFAULT_TRANSFORMATION;
use cyberark::models::{NewSyncPolicy, StateAction, StoreState, SyncPolicy};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::constants::{MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, SYNC_POLICY};
use crate::errors::ProviderError;
use crate::resources::{Resource, decode, merge_optional, require_string, string};
use crate::schema::{Attribute, AttributeType, Schema, object_mut};
use crate::validation::validate_safe_name;

#[derive(Debug, Clone, Deserialize, Validate)]
struct PolicyModel {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    name: String,

    #[serde(default)]
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    description: Option<String>,

    #[serde(default)]
    source_id: Option<String>,

    #[validate(length(min = 1))]
    target_id: String,

    #[validate(custom(function = "validate_safe_name"))]
    safe_name: String,

    #[serde(default)]
    transformation: Option<String>,
}

fn policy_state(state: &Value) -> Result<StoreState, ProviderError> {
    match string(state, "state") {
        Some(value) => StoreState::from_str(&value)
            .map_err(|e| ProviderError::ValidationError(e.to_string())),
        None => Ok(StoreState::Enabled),
    }
}

fn apply(state: &mut Value, policy: &SyncPolicy) -> Result<(), ProviderError> {
    let object = object_mut(state)?;
    object.insert("id".to_string(), Value::from(policy.id.as_str()));
    if !policy.name.is_empty() {
        object.insert("name".to_string(), Value::from(policy.name.as_str()));
    }
    merge_optional(object, "description", policy.description.as_deref());
    if !policy.source.id.is_empty() {
        object.insert("source_id".to_string(), Value::from(policy.source.id.as_str()));
    }
    if !policy.target.id.is_empty() {
        object.insert("target_id".to_string(), Value::from(policy.target.id.as_str()));
    }
    if !policy.filter.data.safe_name.is_empty() {
        object.insert(
            "safe_name".to_string(),
            Value::from(policy.filter.data.safe_name.as_str()),
        );
    }
    if let Some(transformation) = &policy.transformation {
        object.insert(
            "transformation".to_string(),
            Value::from(transformation.predefined.as_str()),
        );
    }
    if let Some(current) = policy.current_state() {
        object.insert("state".to_string(), Value::from(current.to_ascii_uppercase()));
    }
    Ok(())
}

pub struct SyncPolicyResource;

#[async_trait]
impl Resource for SyncPolicyResource {
    fn type_name(&self) -> &'static str {
        SYNC_POLICY
    }

    fn schema(&self) -> Schema {
        Schema::new("Secrets Hub sync policy for one PAM safe")
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute("name", Attribute::required(AttributeType::String).force_new())
            .attribute(
                "description",
                Attribute::optional(AttributeType::String).force_new(),
            )
            .attribute(
                "source_id",
                Attribute::optional_computed(AttributeType::String)
                    .force_new()
                    .describe("Defaults to the tenant's PAM source store."),
            )
            .attribute(
                "target_id",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "safe_name",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "transformation",
                Attribute::optional(AttributeType::String)
                    .with_default(DEFAULT_TRANSFORMATION)
                    .force_new(),
            )
            .attribute(
                "state",
                Attribute::optional(AttributeType::String)
                    .with_default(StoreState::Enabled.as_str())
                    .describe("ENABLED or DISABLED."),
            )
    }

    #[tracing::instrument(skip(self, client, planned))]
    async fn create(&self, client: &CyberArkClient, planned: Value) -> Result<Value, ProviderError> {
        let model: PolicyModel = decode(&planned)?;
        let desired = policy_state(&planned)?;
        let hub = client.secrets_hub();

        let source_id = match model.source_id.as_deref().filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => hub.pam_source_store().await?.id,
        };

        let request = NewSyncPolicy::for_safe(
            model.name.as_str(),
            model.description.clone().filter(|d| !d.is_empty()),
            source_id,
            model.target_id.as_str(),
            model.safe_name.as_str(),
        )
        .with_transformation(
            model
                .transformation
                .as_deref()
                .unwrap_or(DEFAULT_TRANSFORMATION),
        );

        let policy = hub.create_sync_policy(&request).await?;
        tracing::info!("[provider] created sync policy {}", policy.id);

        if desired == StoreState::Disabled {
            hub.set_sync_policy_state(&policy.id, StateAction::Disable).await?;
        }

        let mut state = planned;
        apply(&mut state, &policy)?;
        // the create response reports the initial state
        object_mut(&mut state)?.insert("state".to_string(), Value::from(desired.as_str()));
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current))]
    async fn read(&self, client: &CyberArkClient, current: Value) -> Result<Option<Value>, ProviderError> {
        let id = require_string(&current, "id")?;
        let Some(policy) = client.secrets_hub().get_sync_policy(&id).await? else {
            tracing::warn!("[provider] sync policy {} no longer exists", id);
            return Ok(None);
        };

        let mut state = current;
        apply(&mut state, &policy)?;
        Ok(Some(state))
    }

    #[tracing::instrument(skip(self, client, prior, planned))]
    async fn update(
        &self,
        client: &CyberArkClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = require_string(&prior, "id")?;
        let desired = policy_state(&planned)?;
        if desired != policy_state(&prior)? {
            client
                .secrets_hub()
                .set_sync_policy_state(&id, desired.action())
                .await?;
        }

        let mut state = planned;
        object_mut(&mut state)?.insert("id".to_string(), Value::from(id));
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current))]
    async fn delete(&self, client: &CyberArkClient, current: Value) -> Result<(), ProviderError> {
        let id = require_string(&current, "id")?;
        let hub = client.secrets_hub();
        if policy_state(&current)? == StoreState::Disabled {
            hub.remove_sync_policy(&id).await?;
        } else {
            hub.delete_sync_policy(&id).await?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, client))]
    async fn import(&self, client: &CyberArkClient, id: &str) -> Result<Value, ProviderError> {
        let policy = client
            .secrets_hub()
            .get_sync_policy(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("sync policy {id}")))?;

        let mut state = Value::Null;
        apply(&mut state, &policy)?;
        Ok(state)
    }
}
