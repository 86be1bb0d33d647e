// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Request and response bodies for the PVWA and Secrets Hub APIs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::ZeroizeOnDrop;

use crate::constants::{DEFAULT_MEMBER_TYPE, DEFAULT_SEARCH_IN, DEFAULT_TRANSFORMATION, PAM_SAFE_FILTER};
use crate::errors::ApiError;
use crate::permissions::SafePermissions;

// ==================== PVWA accounts ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretManagement {
    pub automatic_management_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_management_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<i64>,
}

impl SecretManagement {
    pub fn new(automatic: bool, reason: Option<String>) -> Self {
        Self {
            automatic_management_enabled: automatic,
            // PVWA rejects a reason when automatic management is enabled
            manual_management_reason: if automatic { None } else { reason },
            ..Self::default()
        }
    }
}

#[derive(Clone, Serialize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: String,
    pub user_name: String,
    pub platform_id: String,
    pub safe_name: String,
    pub secret_type: String,
    pub secret: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[zeroize(skip)]
    pub platform_account_properties: BTreeMap<String, String>,
    #[zeroize(skip)]
    pub secret_management: SecretManagement,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("user_name", &self.user_name)
            .field("platform_id", &self.platform_id)
            .field("safe_name", &self.safe_name)
            .field("secret_type", &self.secret_type)
            .field("secret", &"[REDACTED]")
            .field("platform_account_properties", &self.platform_account_properties)
            .field("secret_management", &self.secret_management)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub safe_name: Option<String>,
    #[serde(default)]
    pub secret_type: Option<String>,
    #[serde(default)]
    pub platform_account_properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub secret_management: Option<SecretManagement>,
    #[serde(default)]
    pub created_time: Option<i64>,
}

impl Account {
    /// Platform properties come back as strings or numbers depending on the
    /// platform definition; this normalizes both to a string.
    pub fn property(&self, key: &str) -> Option<String> {
        match self.platform_account_properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountList {
    #[serde(default)]
    pub value: Vec<Account>,
    #[serde(default)]
    pub count: Option<u64>,
}

// ==================== PVWA safes ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeRequest {
    pub safe_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub olac_enabled: bool,
    #[serde(rename = "managingCPM", skip_serializing_if = "Option::is_none")]
    pub managing_cpm: Option<String>,
    pub number_of_days_retention: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Safe {
    #[serde(default)]
    pub safe_url_id: String,
    pub safe_name: String,
    #[serde(default)]
    pub safe_number: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub olac_enabled: bool,
    #[serde(rename = "managingCPM", default)]
    pub managing_cpm: Option<String>,
    #[serde(default)]
    pub number_of_versions_retention: Option<u32>,
    #[serde(default)]
    pub number_of_days_retention: Option<u32>,
    #[serde(default)]
    pub creation_time: Option<i64>,
}

impl Safe {
    /// PVWA addresses safes by URL id; older responses omit it and the safe
    /// name is used instead.
    pub fn url_id(&self) -> &str {
        if self.safe_url_id.is_empty() {
            &self.safe_name
        } else {
            &self.safe_url_id
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSafeMember {
    pub member_name: String,
    pub search_in: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_expiration_date: Option<i64>,
    pub permissions: SafePermissions,
    pub member_type: String,
}

impl NewSafeMember {
    pub fn new(member_name: impl Into<String>, permissions: SafePermissions) -> Self {
        Self {
            member_name: member_name.into(),
            search_in: DEFAULT_SEARCH_IN.to_string(),
            membership_expiration_date: None,
            permissions,
            member_type: DEFAULT_MEMBER_TYPE.to_string(),
        }
    }

    pub fn with_member_type(mut self, member_type: impl Into<String>) -> Self {
        self.member_type = member_type.into();
        self
    }

    pub fn with_search_in(mut self, search_in: impl Into<String>) -> Self {
        self.search_in = search_in.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeMember {
    #[serde(default)]
    pub safe_url_id: Option<String>,
    #[serde(default)]
    pub safe_name: Option<String>,
    pub member_name: String,
    #[serde(default)]
    pub member_type: Option<String>,
    #[serde(default)]
    pub member_id: Option<Value>,
    #[serde(default)]
    pub is_predefined_user: Option<bool>,
    #[serde(default)]
    pub permissions: SafePermissions,
}

// ==================== Secrets Hub secret stores ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretStoreType {
    #[serde(rename = "AWS_ASM")]
    AwsAsm,
    #[serde(rename = "AZURE_AKV")]
    AzureAkv,
    #[serde(rename = "GCP_GSM")]
    GcpGsm,
    #[serde(rename = "PAM_PCLOUD")]
    PamPcloud,
}

impl SecretStoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsAsm => "AWS_ASM",
            Self::AzureAkv => "AZURE_AKV",
            Self::GcpGsm => "GCP_GSM",
            Self::PamPcloud => "PAM_PCLOUD",
        }
    }
}

impl FromStr for SecretStoreType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWS_ASM" => Ok(Self::AwsAsm),
            "AZURE_AKV" => Ok(Self::AzureAkv),
            "GCP_GSM" => Ok(Self::GcpGsm),
            "PAM_PCLOUD" => Ok(Self::PamPcloud),
            other => Err(ApiError::DecodeError(format!("unknown secret store type {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreBehavior {
    SecretsTarget,
    SecretsSource,
}

impl StoreBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecretsTarget => "SECRETS_TARGET",
            Self::SecretsSource => "SECRETS_SOURCE",
        }
    }
}

impl FromStr for StoreBehavior {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SECRETS_TARGET" => Ok(Self::SecretsTarget),
            "SECRETS_SOURCE" => Ok(Self::SecretsSource),
            other => Err(ApiError::ConfigError(format!(
                "unknown store behavior {other:?}, expected SECRETS_TARGET or SECRETS_SOURCE"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreState {
    Enabled,
    Disabled,
}

impl StoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
        }
    }

    pub fn action(&self) -> StateAction {
        match self {
            Self::Enabled => StateAction::Enable,
            Self::Disabled => StateAction::Disable,
        }
    }
}

impl FromStr for StoreState {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ENABLED" => Ok(Self::Enabled),
            "DISABLED" => Ok(Self::Disabled),
            other => Err(ApiError::ConfigError(format!(
                "unknown state {other:?}, expected ENABLED or DISABLED"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateAction {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub action: StateAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsStoreData {
    pub account_alias: String,
    pub account_id: String,
    pub region_id: String,
    pub role_name: String,
}

#[derive(Clone, PartialEq, Serialize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct AzureStoreData {
    pub app_client_directory_id: String,
    pub azure_vault_url: String,
    pub app_client_id: String,
    pub app_client_secret: String,
    #[zeroize(skip)]
    pub connection_config: ConnectionConfig,
}

impl fmt::Debug for AzureStoreData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureStoreData")
            .field("app_client_directory_id", &self.app_client_directory_id)
            .field("azure_vault_url", &self.azure_vault_url)
            .field("app_client_id", &self.app_client_id)
            .field("app_client_secret", &"[REDACTED]")
            .field("connection_config", &self.connection_config)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub connection_type: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_type: "PUBLIC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpStoreData {
    pub gcp_project_name: String,
    pub gcp_project_number: String,
    pub gcp_workload_identity_pool_id: String,
    pub gcp_pool_provider_id: String,
    pub service_account_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SecretStoreData {
    Aws(AwsStoreData),
    Azure(AzureStoreData),
    Gcp(GcpStoreData),
}

impl SecretStoreData {
    pub fn store_type(&self) -> SecretStoreType {
        match self {
            Self::Aws(_) => SecretStoreType::AwsAsm,
            Self::Azure(_) => SecretStoreType::AzureAkv,
            Self::Gcp(_) => SecretStoreType::GcpGsm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSecretStore {
    #[serde(rename = "type")]
    pub store_type: SecretStoreType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub state: StoreState,
    pub data: SecretStoreData,
}

impl NewSecretStore {
    /// The store type always follows the shape of `data`.
    pub fn new(name: impl Into<String>, description: Option<String>, data: SecretStoreData) -> Self {
        Self {
            store_type: data.store_type(),
            name: name.into(),
            description,
            state: StoreState::Enabled,
            data,
        }
    }

    pub fn with_state(mut self, state: StoreState) -> Self {
        self.state = state;
        self
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self.data, SecretStoreData::Azure(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStore {
    pub id: String,
    #[serde(rename = "type", default)]
    pub store_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub behaviors: Vec<String>,
    #[serde(default)]
    pub data: Value,
}

impl SecretStore {
    pub fn kind(&self) -> Option<SecretStoreType> {
        self.store_type.parse().ok()
    }

    pub fn current_state(&self) -> Option<&str> {
        current_state(&self.state)
    }

    /// Reads a string field of the type specific `data` block.
    pub fn data_str(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreList {
    #[serde(default)]
    pub secret_stores: Vec<SecretStore>,
}

// ==================== Secrets Hub sync policies ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFilterData {
    pub safe_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyFilter {
    #[serde(rename = "type")]
    pub filter_type: String,
    pub data: PolicyFilterData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub predefined: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSyncPolicy {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: StoreRef,
    pub target: StoreRef,
    pub filter: PolicyFilter,
    pub transformation: Transformation,
}

impl NewSyncPolicy {
    /// A policy syncing every secret in `safe_name` from `source_id` to `target_id`.
    pub fn for_safe(
        name: impl Into<String>,
        description: Option<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        safe_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            source: StoreRef { id: source_id.into() },
            target: StoreRef { id: target_id.into() },
            filter: PolicyFilter {
                filter_type: PAM_SAFE_FILTER.to_string(),
                data: PolicyFilterData {
                    safe_name: safe_name.into(),
                },
            },
            transformation: Transformation {
                predefined: DEFAULT_TRANSFORMATION.to_string(),
            },
        }
    }

    pub fn with_transformation(mut self, predefined: impl Into<String>) -> Self {
        self.transformation.predefined = predefined.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPolicy {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: StoreRef,
    #[serde(default)]
    pub target: StoreRef,
    #[serde(default)]
    pub filter: PolicyFilter,
    #[serde(default)]
    pub transformation: Option<Transformation>,
    #[serde(default)]
    pub state: Value,
}

impl SyncPolicy {
    pub fn current_state(&self) -> Option<&str> {
        current_state(&self.state)
    }
}

/// Secrets Hub reports state either as a bare string or as
/// `{"current": "..."}` depending on the API version.
fn current_state(state: &Value) -> Option<&str> {
    match state {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("current").and_then(Value::as_str),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncPolicyList {
    #[serde(default)]
    pub policies: Vec<SyncPolicy>,
}
