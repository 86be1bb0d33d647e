// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Read-only lookups.
//!
//! | Type | Looks up |
//! |------|----------|
//! | `cyberark_safe` | a safe by name |
//! | `cyberark_secret_store` | a secret store by name and behavior |
//! | `cyberark_pam_source_store` | the tenant's PAM source store |

use std::str::FromStr;

use async_trait::async_trait;
use cyberark::CyberArkClient;
use cyberark::models::{SecretStore, StoreBehavior};
use serde_json::{Value, json};

use crate::constants::{PAM_SOURCE_STORE, SAFE, SECRET_STORE};
use crate::errors::ProviderError;
use crate::resources::{DataSource, require_string, string};
use crate::schema::{Attribute, AttributeType, Schema, object_mut};

pub fn all() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(SafeDataSource),
        Box::new(SecretStoreDataSource),
        Box::new(PamSourceStoreDataSource),
    ]
}

pub struct SafeDataSource;

#[async_trait]
impl DataSource for SafeDataSource {
    fn type_name(&self) -> &'static str {
        SAFE
    }

    fn schema(&self) -> Schema {
        Schema::new("Look up a PVWA safe by name")
            .attribute("safe_name", Attribute::required(AttributeType::String))
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute("safe_url_id", Attribute::computed(AttributeType::String))
            .attribute("safe_number", Attribute::computed(AttributeType::Number))
            .attribute("description", Attribute::computed(AttributeType::String))
            .attribute("managing_cpm", Attribute::computed(AttributeType::String))
            .attribute("retention", Attribute::computed(AttributeType::Number))
    }

    #[tracing::instrument(skip(self, client, config))]
    async fn read(&self, client: &CyberArkClient, config: Value) -> Result<Value, ProviderError> {
        let name = require_string(&config, "safe_name")?;
        let safe = client
            .pam()
            .get_safe(&name)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("safe {name}")))?;

        let mut state = config;
        let object = object_mut(&mut state)?;
        object.insert("id".to_string(), Value::from(safe.url_id()));
        object.insert("safe_url_id".to_string(), Value::from(safe.url_id()));
        object.insert("safe_number".to_string(), json!(safe.safe_number));
        object.insert("description".to_string(), json!(safe.description));
        object.insert("managing_cpm".to_string(), json!(safe.managing_cpm));
        object.insert("retention".to_string(), json!(safe.number_of_days_retention));
        Ok(state)
    }
}

fn store_state(state: &mut Value, store: &SecretStore) -> Result<(), ProviderError> {
    let object = object_mut(state)?;
    object.insert("id".to_string(), Value::from(store.id.as_str()));
    object.insert("name".to_string(), Value::from(store.name.as_str()));
    object.insert("type".to_string(), Value::from(store.store_type.as_str()));
    object.insert(
        "state".to_string(),
        json!(store.current_state().map(str::to_ascii_uppercase)),
    );
    Ok(())
}

pub struct SecretStoreDataSource;

#[async_trait]
impl DataSource for SecretStoreDataSource {
    fn type_name(&self) -> &'static str {
        SECRET_STORE
    }

    fn schema(&self) -> Schema {
        Schema::new("Look up a Secrets Hub secret store by name")
            .attribute("name", Attribute::required(AttributeType::String))
            .attribute(
                "behavior",
                Attribute::optional(AttributeType::String)
                    .with_default(StoreBehavior::SecretsTarget.as_str())
                    .describe("SECRETS_TARGET or SECRETS_SOURCE."),
            )
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute("type", Attribute::computed(AttributeType::String))
            .attribute("state", Attribute::computed(AttributeType::String))
    }

    #[tracing::instrument(skip(self, client, config))]
    async fn read(&self, client: &CyberArkClient, config: Value) -> Result<Value, ProviderError> {
        let name = require_string(&config, "name")?;
        let behavior = match string(&config, "behavior") {
            Some(value) => StoreBehavior::from_str(&value)
                .map_err(|e| ProviderError::ValidationError(e.to_string()))?,
            None => StoreBehavior::SecretsTarget,
        };

        let store = client
            .secrets_hub()
            .list_secret_stores(Some(behavior))
            .await?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                ProviderError::NotFound(format!("secret store {name} ({})", behavior.as_str()))
            })?;

        let mut state = config;
        store_state(&mut state, &store)?;
        Ok(state)
    }
}

pub struct PamSourceStoreDataSource;

#[async_trait]
impl DataSource for PamSourceStoreDataSource {
    fn type_name(&self) -> &'static str {
        PAM_SOURCE_STORE
    }

    fn schema(&self) -> Schema {
        Schema::new("The Privilege Cloud source store of the tenant")
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute("name", Attribute::computed(AttributeType::String))
            .attribute("type", Attribute::computed(AttributeType::String))
            .attribute("state", Attribute::computed(AttributeType::String))
    }

    #[tracing::instrument(skip(self, client, config))]
    async fn read(&self, client: &CyberArkClient, config: Value) -> Result<Value, ProviderError> {
        let store = client.secrets_hub().pam_source_store().await?;
        let mut state = config;
        store_state(&mut state, &store)?;
        Ok(state)
    }
}
