// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Managed resource types.
//!
//! Every resource implements [`Resource`]; the [`Provider`](crate::provider::Provider)
//! validates and defaults states against [`Resource::schema`] before calling
//! into it, so implementations only translate between state objects and the
//! CyberArk APIs.
//!
//! | Type | Module |
//! |------|--------|
//! | `cyberark_aws_account`, `cyberark_azure_account`, `cyberark_db_account` | [`account`] |
//! | `cyberark_safe` | [`safe`] |
//! | `cyberark_aws_secret_store`, `cyberark_azure_secret_store`, `cyberark_gcp_secret_store` | [`secret_store`] |
//! | `cyberark_secret_store_scan` | [`scan`] |
//! | `cyberark_sync_policy` | [`sync_policy`] |

pub mod account;
pub mod safe;
pub mod scan;
pub mod secret_store;
pub mod sync_policy;

use async_trait::async_trait;
use cyberark::CyberArkClient;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use crate::errors::ProviderError;
use crate::schema::Schema;

#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Creates the remote object and returns the new state, including
    /// computed attributes.
    async fn create(&self, client: &CyberArkClient, planned: Value) -> Result<Value, ProviderError>;

    /// Refreshes `current`; `None` when the remote object no longer exists.
    async fn read(&self, client: &CyberArkClient, current: Value) -> Result<Option<Value>, ProviderError>;

    async fn update(
        &self,
        _client: &CyberArkClient,
        _prior: Value,
        _planned: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::unsupported(self.type_name(), "update"))
    }

    async fn delete(&self, client: &CyberArkClient, current: Value) -> Result<(), ProviderError>;

    async fn import(&self, _client: &CyberArkClient, _id: &str) -> Result<Value, ProviderError> {
        Err(ProviderError::unsupported(self.type_name(), "import"))
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, client: &CyberArkClient, config: Value) -> Result<Value, ProviderError>;
}

/// Every resource type the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(account::AccountResource::new(account::AccountKind::Aws)),
        Box::new(account::AccountResource::new(account::AccountKind::Azure)),
        Box::new(account::AccountResource::new(account::AccountKind::Database)),
        Box::new(safe::SafeResource),
        Box::new(secret_store::SecretStoreResource::new(secret_store::StoreKind::Aws)),
        Box::new(secret_store::SecretStoreResource::new(secret_store::StoreKind::Azure)),
        Box::new(secret_store::SecretStoreResource::new(secret_store::StoreKind::Gcp)),
        Box::new(scan::SecretStoreScanResource),
        Box::new(sync_policy::SyncPolicyResource),
    ]
}

/// Decodes a state object into a typed model and runs its field validators.
pub fn decode<M>(state: &Value) -> Result<M, ProviderError>
where
    M: DeserializeOwned + Validate,
{
    let model: M = serde_json::from_value(state.clone())
        .map_err(|e| ProviderError::ValidationError(e.to_string()))?;
    model.validate()?;
    Ok(model)
}

/// A non-empty string attribute.
pub fn string(state: &Value, key: &str) -> Option<String> {
    state
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn require_string(state: &Value, key: &str) -> Result<String, ProviderError> {
    string(state, key).ok_or_else(|| ProviderError::ValidationError(format!("{key} is required")))
}

/// Stores an optional remote string. An empty remote value only clears an
/// attribute that was previously non-empty, so unset and empty stay equal.
pub fn merge_optional(object: &mut Map<String, Value>, key: &str, remote: Option<&str>) {
    match remote.filter(|s| !s.is_empty()) {
        Some(value) => {
            object.insert(key.to_string(), Value::from(value));
        }
        None => {
            let was_set = object
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if was_set {
                object.insert(key.to_string(), Value::Null);
            }
        }
    }
}

/// Converts a string the API returns into the attribute's JSON type.
pub fn typed_value(raw: &str, attribute_type: crate::schema::AttributeType) -> Value {
    use crate::schema::AttributeType;

    match attribute_type {
        AttributeType::String => Value::from(raw),
        AttributeType::Bool => raw
            .parse::<bool>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw)),
        AttributeType::Number => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<f64>().map(Value::from))
            .unwrap_or_else(|_| Value::from(raw)),
    }
}

/// Renders an attribute value the way PVWA platform properties expect it.
pub fn plain_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
