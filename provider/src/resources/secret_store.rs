// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Secrets Hub target stores: AWS Secrets Manager, Azure Key Vault and GCP
//! Secret Manager.
//!
//! Only `state` (ENABLED / DISABLED) changes in place. Secrets Hub does not
//! delete an enabled store, so delete disables it first unless the state
//! already reads DISABLED.

use std::str::FromStr;

use async_trait::async_trait;
use cyberark::models::{
    AwsStoreData, AzureStoreData, ConnectionConfig, GcpStoreData, NewSecretStore, SecretStore,
    SecretStoreData, SecretStoreType, StateAction, StoreState,
};
use cyberark::{ApiError, CyberArkClient};
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::constants::{
    AWS_SECRET_STORE, AZURE_SECRET_STORE, GCP_SECRET_STORE, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use crate::errors::ProviderError;
use crate::resources::{Resource, decode, merge_optional, require_string, string};
use crate::schema::{Attribute, AttributeType, Schema, object_mut};
use crate::validation::{
    validate_aws_account_id, validate_aws_region, validate_email, validate_https_url,
};

/// A type specific attribute and where Secrets Hub keeps it in `data`.
#[derive(Clone, Copy)]
struct StoreField {
    attribute: &'static str,
    pointer: &'static str,
    required: bool,
    sensitive: bool,
    validate: Option<fn(&str) -> Result<(), ValidationError>>,
}

const fn field(attribute: &'static str, pointer: &'static str) -> StoreField {
    StoreField {
        attribute,
        pointer,
        required: true,
        sensitive: false,
        validate: None,
    }
}

const AWS_FIELDS: &[StoreField] = &[
    StoreField {
        validate: Some(validate_aws_account_id),
        ..field("aws_account_id", "/accountId")
    },
    field("aws_account_alias", "/accountAlias"),
    StoreField {
        validate: Some(validate_aws_region),
        ..field("aws_account_region", "/regionId")
    },
    field("aws_iam_role", "/roleName"),
];

const AZURE_FIELDS: &[StoreField] = &[
    field("azure_app_client_directory_id", "/appClientDirectoryId"),
    StoreField {
        validate: Some(validate_https_url),
        ..field("azure_vault_url", "/azureVaultUrl")
    },
    field("azure_app_client_id", "/appClientId"),
    StoreField {
        sensitive: true,
        ..field("azure_app_client_secret", "/appClientSecret")
    },
    StoreField {
        required: false,
        ..field("azure_connection_type", "/connectionConfig/connectionType")
    },
];

const GCP_FIELDS: &[StoreField] = &[
    field("gcp_project_name", "/gcpProjectName"),
    field("gcp_project_number", "/gcpProjectNumber"),
    field("gcp_workload_identity_pool_id", "/gcpWorkloadIdentityPoolId"),
    field("gcp_pool_provider_id", "/gcpPoolProviderId"),
    StoreField {
        validate: Some(validate_email),
        ..field("gcp_service_account_email", "/serviceAccountEmail")
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Aws,
    Azure,
    Gcp,
}

impl StoreKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Aws => AWS_SECRET_STORE,
            Self::Azure => AZURE_SECRET_STORE,
            Self::Gcp => GCP_SECRET_STORE,
        }
    }

    pub fn store_type(&self) -> SecretStoreType {
        match self {
            Self::Aws => SecretStoreType::AwsAsm,
            Self::Azure => SecretStoreType::AzureAkv,
            Self::Gcp => SecretStoreType::GcpGsm,
        }
    }

    fn fields(&self) -> &'static [StoreField] {
        match self {
            Self::Aws => AWS_FIELDS,
            Self::Azure => AZURE_FIELDS,
            Self::Gcp => GCP_FIELDS,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Aws => "Secrets Hub target store in AWS Secrets Manager",
            Self::Azure => "Secrets Hub target store in Azure Key Vault",
            Self::Gcp => "Secrets Hub target store in GCP Secret Manager",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
struct StoreModel {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    name: String,

    #[serde(default)]
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    description: Option<String>,

    #[serde(default)]
    state: Option<String>,
}

/// Missing state means enabled, matching what Secrets Hub does on create.
fn parse_state(value: Option<&str>) -> Result<StoreState, ProviderError> {
    match value {
        Some(value) => StoreState::from_str(value)
            .map_err(|e| ProviderError::ValidationError(format!("state: {e}"))),
        None => Ok(StoreState::Enabled),
    }
}

fn store_state(state: &Value) -> Result<StoreState, ProviderError> {
    parse_state(string(state, "state").as_deref())
}

pub struct SecretStoreResource {
    kind: StoreKind,
}

impl SecretStoreResource {
    pub fn new(kind: StoreKind) -> Self {
        Self { kind }
    }

    fn new_store(&self, planned: &Value) -> Result<NewSecretStore, ProviderError> {
        let model: StoreModel = decode(planned)?;
        let state = parse_state(model.state.as_deref())?;

        for store_field in self.kind.fields() {
            let value = string(planned, store_field.attribute);
            if let (Some(validate), Some(value)) = (store_field.validate, value) {
                validate(&value).map_err(|e| {
                    ProviderError::ValidationError(format!("{}: {}", store_field.attribute, e))
                })?;
            }
        }

        let value = |name: &str| require_string(planned, name);
        let data = match self.kind {
            StoreKind::Aws => SecretStoreData::Aws(AwsStoreData {
                account_alias: value("aws_account_alias")?,
                account_id: value("aws_account_id")?,
                region_id: value("aws_account_region")?,
                role_name: value("aws_iam_role")?,
            }),
            StoreKind::Azure => SecretStoreData::Azure(AzureStoreData {
                app_client_directory_id: value("azure_app_client_directory_id")?,
                azure_vault_url: value("azure_vault_url")?,
                app_client_id: value("azure_app_client_id")?,
                app_client_secret: value("azure_app_client_secret")?,
                connection_config: string(planned, "azure_connection_type")
                    .map(|connection_type| ConnectionConfig { connection_type })
                    .unwrap_or_default(),
            }),
            StoreKind::Gcp => SecretStoreData::Gcp(GcpStoreData {
                gcp_project_name: value("gcp_project_name")?,
                gcp_project_number: value("gcp_project_number")?,
                gcp_workload_identity_pool_id: value("gcp_workload_identity_pool_id")?,
                gcp_pool_provider_id: value("gcp_pool_provider_id")?,
                service_account_email: value("gcp_service_account_email")?,
            }),
        };

        Ok(NewSecretStore::new(model.name.clone(), model.description.clone(), data).with_state(state))
    }

    fn apply(&self, state: &mut Value, store: &SecretStore) -> Result<(), ProviderError> {
        let object = object_mut(state)?;
        object.insert("id".to_string(), Value::from(store.id.as_str()));
        if !store.name.is_empty() {
            object.insert("name".to_string(), Value::from(store.name.as_str()));
        }
        merge_optional(object, "description", store.description.as_deref());
        if let Some(current) = store.current_state() {
            object.insert("state".to_string(), Value::from(current.to_ascii_uppercase()));
        }

        for store_field in self.kind.fields().iter().filter(|f| !f.sensitive) {
            let value = match store.data.pointer(store_field.pointer) {
                Some(Value::String(s)) => Value::from(s.as_str()),
                Some(Value::Null) | None => continue,
                Some(other) => Value::from(other.to_string()),
            };
            object.insert(store_field.attribute.to_string(), value);
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for SecretStoreResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> Schema {
        let mut schema = Schema::new(self.kind.description())
            .attribute(
                "id",
                Attribute::computed(AttributeType::String).describe("Secrets Hub store ID."),
            )
            .attribute("name", Attribute::required(AttributeType::String).force_new())
            .attribute(
                "description",
                Attribute::optional(AttributeType::String).force_new(),
            )
            .attribute(
                "state",
                Attribute::optional(AttributeType::String)
                    .with_default(StoreState::Enabled.as_str())
                    .describe("ENABLED or DISABLED."),
            );

        for store_field in self.kind.fields() {
            let mut attribute = if store_field.required {
                Attribute::required(AttributeType::String)
            } else {
                Attribute::optional(AttributeType::String)
            };
            if store_field.sensitive {
                attribute = attribute.sensitive();
            }
            if store_field.attribute == "azure_connection_type" {
                attribute = attribute.with_default(ConnectionConfig::default().connection_type);
            }
            schema = schema.attribute(store_field.attribute, attribute.force_new());
        }
        schema
    }

    #[tracing::instrument(skip(self, client, planned), fields(type_name = self.type_name()))]
    async fn create(&self, client: &CyberArkClient, planned: Value) -> Result<Value, ProviderError> {
        let request = self.new_store(&planned)?;
        let store = client.secrets_hub().create_secret_store(&request).await?;
        tracing::info!("[provider] created {} {}", self.type_name(), store.id);

        let mut state = planned;
        self.apply(&mut state, &store)?;
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current), fields(type_name = self.type_name()))]
    async fn read(&self, client: &CyberArkClient, current: Value) -> Result<Option<Value>, ProviderError> {
        let id = require_string(&current, "id")?;
        let Some(store) = client.secrets_hub().get_secret_store(&id).await? else {
            tracing::warn!("[provider] secret store {} no longer exists", id);
            return Ok(None);
        };

        let mut state = current;
        self.apply(&mut state, &store)?;
        Ok(Some(state))
    }

    #[tracing::instrument(skip(self, client, prior, planned), fields(type_name = self.type_name()))]
    async fn update(
        &self,
        client: &CyberArkClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = require_string(&prior, "id")?;
        let desired = store_state(&planned)?;
        if desired != store_state(&prior)? {
            client
                .secrets_hub()
                .set_secret_store_state(&id, desired.action())
                .await?;
        }

        let mut state = planned;
        object_mut(&mut state)?.insert("id".to_string(), Value::from(id));
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current), fields(type_name = self.type_name()))]
    async fn delete(&self, client: &CyberArkClient, current: Value) -> Result<(), ProviderError> {
        let id = require_string(&current, "id")?;
        let hub = client.secrets_hub();
        if store_state(&current)? != StoreState::Disabled {
            match hub.set_secret_store_state(&id, StateAction::Disable).await {
                Ok(()) => {}
                Err(ApiError::NotFound(_)) => {
                    tracing::warn!("[provider] secret store {} already deleted", id);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
        hub.delete_secret_store(&id).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, client), fields(type_name = self.type_name()))]
    async fn import(&self, client: &CyberArkClient, id: &str) -> Result<Value, ProviderError> {
        let store = client
            .secrets_hub()
            .get_secret_store(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("secret store {id}")))?;

        if store.kind() != Some(self.kind.store_type()) {
            return Err(ProviderError::ValidationError(format!(
                "secret store {id} is of type {}, not {}",
                store.store_type,
                self.kind.store_type().as_str()
            )));
        }

        let mut state = Value::Null;
        self.apply(&mut state, &store)?;
        Ok(state)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aws_state() -> Value {
        json!({
            "name": "aws-target",
            "description": "prod",
            "aws_account_id": "123456789012",
            "aws_account_alias": "prod",
            "aws_account_region": "us-east-1",
            "aws_iam_role": "SecretsHubRole"
        })
    }

    fn azure_state() -> Value {
        json!({
            "name": "akv",
            "state": "DISABLED",
            "azure_app_client_directory_id": "tenant-guid",
            "azure_vault_url": "https://myvault.vault.azure.net",
            "azure_app_client_id": "app-guid",
            "azure_app_client_secret": "s3cr3t"
        })
    }

    #[test]
    fn test_new_aws_store() {
        let store = SecretStoreResource::new(StoreKind::Aws)
            .new_store(&aws_state())
            .unwrap();
        assert_eq!(store.store_type, SecretStoreType::AwsAsm);
        assert_eq!(store.state, StoreState::Enabled);
        let body = serde_json::to_value(&store).unwrap();
        assert_eq!(body["type"], "AWS_ASM");
        assert_eq!(body["data"]["accountId"], "123456789012");
        assert_eq!(body["data"]["regionId"], "us-east-1");
        assert_eq!(body["data"]["roleName"], "SecretsHubRole");
    }

    #[test]
    fn test_new_azure_store_defaults_connection_type() {
        let store = SecretStoreResource::new(StoreKind::Azure)
            .new_store(&azure_state())
            .unwrap();
        assert!(store.is_sensitive());
        assert_eq!(store.state, StoreState::Disabled);
        let body = serde_json::to_value(&store).unwrap();
        assert_eq!(body["data"]["connectionConfig"]["connectionType"], "PUBLIC");
        assert_eq!(body["data"]["appClientSecret"], "s3cr3t");
    }

    #[test]
    fn test_new_store_validates_fields() {
        let mut state = aws_state();
        state["aws_account_region"] = json!("Virginia");
        let err = SecretStoreResource::new(StoreKind::Aws)
            .new_store(&state)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: aws_account_region: \"Virginia\" is not an AWS region code such as \"us-east-1\""
        );

        let mut state = azure_state();
        state["azure_vault_url"] = json!("http://insecure");
        assert!(SecretStoreResource::new(StoreKind::Azure).new_store(&state).is_err());
    }

    #[test]
    fn test_new_store_rejects_unknown_state() {
        let mut state = aws_state();
        state["state"] = json!("PAUSED");
        assert!(SecretStoreResource::new(StoreKind::Aws).new_store(&state).is_err());
    }

    #[test]
    fn test_apply_reads_back_data_but_not_secret() {
        let store: SecretStore = serde_json::from_value(json!({
            "id": "store-1",
            "type": "AZURE_AKV",
            "name": "akv",
            "state": "enabled",
            "data": {
                "appClientDirectoryId": "tenant-guid",
                "azureVaultUrl": "https://myvault.vault.azure.net",
                "appClientId": "app-guid",
                "connectionConfig": {"connectionType": "PRIVATE"}
            }
        }))
        .unwrap();

        let mut state = json!({"azure_app_client_secret": "s3cr3t"});
        SecretStoreResource::new(StoreKind::Azure)
            .apply(&mut state, &store)
            .unwrap();

        assert_eq!(state["id"], "store-1");
        assert_eq!(state["state"], "ENABLED");
        assert_eq!(state["azure_connection_type"], "PRIVATE");
        assert_eq!(state["azure_vault_url"], "https://myvault.vault.azure.net");
        assert_eq!(state["azure_app_client_secret"], "s3cr3t");
    }

    #[test]
    fn test_schema_only_state_is_updatable() {
        let schema = SecretStoreResource::new(StoreKind::Gcp).schema();
        let in_place: Vec<&String> = schema
            .attributes
            .iter()
            .filter(|(_, a)| !a.computed && !a.force_new)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(in_place, vec!["state"]);
    }

    #[test]
    fn test_store_state_defaults_to_enabled() {
        assert_eq!(store_state(&json!({})).unwrap(), StoreState::Enabled);
        assert_eq!(store_state(&json!({"state": "disabled"})).unwrap(), StoreState::Disabled);
        assert_eq!(parse_state(None).unwrap(), StoreState::Enabled);
        let err = parse_state(Some("PAUSED")).unwrap_err();
        assert!(err.to_string().contains("state: "));
    }
}
