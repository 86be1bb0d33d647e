// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Privileged accounts stored in a PVWA safe.
//!
//! The three account resources share one model and differ only in the
//! platform properties they expose. PVWA has no usable in-place update for
//! these accounts, so every attribute forces a replacement. The one update
//! accepted is recording a secret that was unknown after import.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cyberark::CyberArkClient;
use cyberark::models::{Account, NewAccount, SecretManagement};
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};
use zeroize::ZeroizeOnDrop;

use crate::constants::{AWS_ACCOUNT, AZURE_ACCOUNT, DB_ACCOUNT, MAX_NAME_LENGTH};
use crate::errors::ProviderError;
use crate::resources::{Resource, decode, plain_string, require_string, typed_value};
use crate::schema::{Attribute, AttributeType, Schema, object_mut};
use crate::validation::{validate_aws_account_id, validate_aws_region, validate_safe_name};

const DEFAULT_SECRET_TYPE: &str = "password";

/// Maps a resource attribute to a PVWA platform account property.
#[derive(Clone, Copy)]
pub struct PlatformProperty {
    pub attribute: &'static str,
    pub property: &'static str,
    pub attribute_type: AttributeType,
    pub required: bool,
    pub validate: Option<fn(&str) -> Result<(), ValidationError>>,
}

const fn property(attribute: &'static str, property: &'static str) -> PlatformProperty {
    PlatformProperty {
        attribute,
        property,
        attribute_type: AttributeType::String,
        required: false,
        validate: None,
    }
}

const AWS_PROPERTIES: &[PlatformProperty] = &[
    PlatformProperty {
        required: true,
        ..property("aws_kid", "AWSKeyID")
    },
    PlatformProperty {
        required: true,
        validate: Some(validate_aws_account_id),
        ..property("aws_account_id", "AWSAccountID")
    },
    property("aws_alias", "AWSAccountAliasName"),
    PlatformProperty {
        validate: Some(validate_aws_region),
        ..property("aws_account_region", "Region")
    },
];

const AZURE_PROPERTIES: &[PlatformProperty] = &[
    PlatformProperty {
        required: true,
        ..property("azure_app_id", "ApplicationID")
    },
    property("azure_app_object_id", "ApplicationObjectID"),
    property("azure_key_id", "KeyID"),
    property("azure_key_description", "KeyDescription"),
    PlatformProperty {
        attribute_type: AttributeType::Number,
        ..property("azure_duration", "Duration")
    },
];

const DB_PROPERTIES: &[PlatformProperty] = &[
    PlatformProperty {
        attribute_type: AttributeType::Number,
        ..property("db_port", "Port")
    },
    property("db_dsn", "DSN"),
    property("dbname", "Database"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Aws,
    Azure,
    Database,
}

impl AccountKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Aws => AWS_ACCOUNT,
            Self::Azure => AZURE_ACCOUNT,
            Self::Database => DB_ACCOUNT,
        }
    }

    pub fn properties(&self) -> &'static [PlatformProperty] {
        match self {
            Self::Aws => AWS_PROPERTIES,
            Self::Azure => AZURE_PROPERTIES,
            Self::Database => DB_PROPERTIES,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Aws => "AWS access key account",
            Self::Azure => "Azure application (service principal) secret account",
            Self::Database => "Database account",
        }
    }

    /// Collects and validates the platform properties set in `state`.
    pub fn platform_properties(&self, state: &Value) -> Result<BTreeMap<String, String>, ProviderError> {
        let mut properties = BTreeMap::new();
        for prop in self.properties() {
            let Some(value) = state.get(prop.attribute).and_then(plain_string) else {
                continue;
            };
            if let Some(validate) = prop.validate {
                validate(&value).map_err(|e| {
                    ProviderError::ValidationError(format!("{}: {}", prop.attribute, e))
                })?;
            }
            properties.insert(prop.property.to_string(), value);
        }
        Ok(properties)
    }
}

#[derive(Deserialize, Validate, ZeroizeOnDrop)]
struct AccountModel {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    name: String,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    address: String,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    username: String,

    #[validate(length(min = 1))]
    platform: String,

    #[validate(custom(function = "validate_safe_name"))]
    safe: String,

    #[serde(default)]
    secret_type: Option<String>,

    #[serde(default)]
    secret: Option<String>,

    #[serde(default)]
    #[zeroize(skip)]
    sm_manage: Option<bool>,

    #[serde(default)]
    sm_manage_reason: Option<String>,
}

pub struct AccountResource {
    kind: AccountKind,
}

impl AccountResource {
    pub fn new(kind: AccountKind) -> Self {
        Self { kind }
    }

    fn new_account(&self, planned: &Value) -> Result<NewAccount, ProviderError> {
        let model: AccountModel = decode(planned)?;
        let secret = model
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::ValidationError("secret is required".to_string()))?;

        Ok(NewAccount {
            name: Some(model.name.clone()),
            address: model.address.clone(),
            user_name: model.username.clone(),
            platform_id: model.platform.clone(),
            safe_name: model.safe.clone(),
            secret_type: model
                .secret_type
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SECRET_TYPE.to_string()),
            secret: secret.to_string(),
            platform_account_properties: self.kind.platform_properties(planned)?,
            secret_management: SecretManagement::new(
                model.sm_manage.unwrap_or(false),
                model.sm_manage_reason.clone(),
            ),
        })
    }

    /// Overlays what PVWA reports onto `state`. The secret is never returned
    /// and is left as it was.
    fn apply(&self, state: &mut Value, account: &Account) -> Result<(), ProviderError> {
        let object = object_mut(state)?;
        object.insert("id".to_string(), Value::from(account.id.as_str()));

        let fields = [
            ("name", &account.name),
            ("address", &account.address),
            ("username", &account.user_name),
            ("platform", &account.platform_id),
            ("safe", &account.safe_name),
            ("secret_type", &account.secret_type),
        ];
        for (attribute, value) in fields {
            if let Some(value) = value {
                object.insert(attribute.to_string(), Value::from(value.as_str()));
            }
        }

        if let Some(management) = &account.secret_management {
            object.insert(
                "sm_manage".to_string(),
                Value::from(management.automatic_management_enabled),
            );
            if let Some(reason) = &management.manual_management_reason {
                object.insert("sm_manage_reason".to_string(), Value::from(reason.as_str()));
            }
        }

        for prop in self.kind.properties() {
            if let Some(raw) = account.property(prop.property) {
                object.insert(
                    prop.attribute.to_string(),
                    typed_value(&raw, prop.attribute_type),
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for AccountResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> Schema {
        let mut schema = Schema::new(self.kind.description())
            .attribute(
                "id",
                Attribute::computed(AttributeType::String).describe("PVWA account ID."),
            )
            .attribute(
                "name",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "address",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "username",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "platform",
                Attribute::required(AttributeType::String)
                    .force_new()
                    .describe("Platform ID the account is managed by."),
            )
            .attribute(
                "safe",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "secret_type",
                Attribute::optional(AttributeType::String)
                    .with_default(DEFAULT_SECRET_TYPE)
                    .force_new(),
            )
            .attribute(
                "secret",
                Attribute::required(AttributeType::String)
                    .sensitive()
                    .force_new(),
            )
            .attribute(
                "sm_manage",
                Attribute::optional(AttributeType::Bool)
                    .with_default(false)
                    .force_new()
                    .describe("Let the CPM rotate the secret."),
            )
            .attribute(
                "sm_manage_reason",
                Attribute::optional(AttributeType::String).force_new(),
            );

        for prop in self.kind.properties() {
            let attribute = if prop.required {
                Attribute::required(prop.attribute_type)
            } else {
                Attribute::optional(prop.attribute_type)
            };
            schema = schema.attribute(
                prop.attribute,
                attribute
                    .force_new()
                    .describe(format!("Platform property {}.", prop.property)),
            );
        }
        schema
    }

    #[tracing::instrument(skip(self, client, planned), fields(type_name = self.type_name()))]
    async fn create(&self, client: &CyberArkClient, planned: Value) -> Result<Value, ProviderError> {
        let request = self.new_account(&planned)?;
        let account = client.pam().create_account(&request).await?;
        tracing::info!("[provider] created {} {}", self.type_name(), account.id);

        let mut state = planned;
        self.apply(&mut state, &account)?;
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current), fields(type_name = self.type_name()))]
    async fn read(&self, client: &CyberArkClient, current: Value) -> Result<Option<Value>, ProviderError> {
        let id = require_string(&current, "id")?;
        let Some(account) = client.pam().get_account(&id).await? else {
            tracing::warn!("[provider] account {} no longer exists", id);
            return Ok(None);
        };

        let mut state = current;
        self.apply(&mut state, &account)?;
        Ok(Some(state))
    }

    /// Only adopts sensitive values that were unknown in `prior`; the vault
    /// is not touched.
    #[tracing::instrument(skip(self, _client, prior, planned), fields(type_name = self.type_name()))]
    async fn update(
        &self,
        _client: &CyberArkClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let schema = self.schema();
        let changed = schema.changed(&prior, &planned);
        let adopting = changed
            .iter()
            .all(|name| schema.adopts_unknown_sensitive(&prior, name));
        if !adopting {
            return Err(ProviderError::unsupported(self.type_name(), "update"));
        }

        let id = require_string(&prior, "id")?;
        tracing::info!("[provider] recorded secret for imported account {}", id);
        let mut state = planned;
        object_mut(&mut state)?.insert("id".to_string(), Value::from(id));
        Ok(state)
    }

    #[tracing::instrument(skip(self, client, current), fields(type_name = self.type_name()))]
    async fn delete(&self, client: &CyberArkClient, current: Value) -> Result<(), ProviderError> {
        let id = require_string(&current, "id")?;
        client.pam().delete_account(&id).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, client), fields(type_name = self.type_name()))]
    async fn import(&self, client: &CyberArkClient, id: &str) -> Result<Value, ProviderError> {
        let account = client
            .pam()
            .get_account(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("account {id}")))?;

        let mut state = Value::Null;
        self.apply(&mut state, &account)?;
        Ok(state)
    }
}
