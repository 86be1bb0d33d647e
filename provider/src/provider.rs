// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Resource lifecycle dispatch.
//!
//! [`Provider`] owns the authenticated [`CyberArkClient`] and the registry of
//! resource and data source types. It applies schema defaults and validation
//! to incoming states, so resource implementations only see well-formed
//! objects, and it handles the parts of planning that follow from the schema
//! alone.

use std::collections::BTreeMap;

use cyberark::CyberArkClient;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::configuration::ProviderConfig;
use crate::data_sources;
use crate::errors::{Diagnostic, ProviderError};
use crate::models::PlanResponse;
use crate::resources::{self, DataSource, Resource};
use crate::schema::ProviderSchema;

pub struct Provider {
    client: RwLock<Option<CyberArkClient>>,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    pub fn new() -> Self {
        Self {
            client: RwLock::new(None),
            resources: resources::all()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources::all()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    /// A provider that is already configured with `client`.
    pub fn with_client(client: CyberArkClient) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            ..Self::new()
        }
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: ProviderConfig::schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (name.to_string(), r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.to_string(), d.schema()))
                .collect(),
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Validates `config`, authenticates and replaces the current client.
    /// A replaced PVWA session is logged off.
    #[tracing::instrument(skip(self, config))]
    pub async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = ProviderConfig::schema();
        let mut config = config;
        schema.apply_defaults(&mut config)?;
        schema.validate(&config)?;

        let config: ProviderConfig = serde_json::from_value(config)
            .map_err(|e| ProviderError::ValidationError(e.to_string()))?;
        let config = config.with_env_fallback();
        tracing::debug!("[provider] configuring with {:?}", config);
        let client_config = config.client_config()?;

        let mut diagnostics = Vec::new();
        if client_config.debug {
            diagnostics.push(Diagnostic::warning(
                "Debug logging enabled",
                "CyberArk request and response bodies are logged at debug level; secrets are redacted.",
            ));
        }

        let client = CyberArkClient::connect(&client_config).await?;
        tracing::info!(
            "[provider] configured for tenant {} ({})",
            client_config.tenant,
            client_config.domain
        );

        let previous = self.client.write().await.replace(client);
        if let Some(previous) = previous {
            previous.close().await;
        }
        Ok(diagnostics)
    }

    /// Ends the current session, if any.
    pub async fn shutdown(&self) {
        if let Some(client) = self.client.write().await.take() {
            client.close().await;
        }
    }

    async fn client(&self) -> Result<CyberArkClient, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(ProviderError::NotConfigured)
    }

    fn resource(&self, type_name: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(type_name)
            .map(|boxed| &**boxed)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(type_name)
            .map(|boxed| &**boxed)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    /// Computes the planned state for `proposed`. Needs no client.
    ///
    /// Defaults are filled in, computed attributes the configuration leaves
    /// unset are carried over from `prior`, and changed `force_new`
    /// attributes are listed in `requires_replace`. A replacement plan has
    /// its provider-computed attributes unset.
    #[tracing::instrument(skip(self, prior, proposed))]
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<Value>,
        proposed: Value,
    ) -> Result<PlanResponse, ProviderError> {
        let schema = self.resource(type_name)?.schema();

        let mut planned = proposed;
        schema.apply_defaults(&mut planned)?;
        schema.validate(&planned)?;

        let mut requires_replace = Vec::new();
        if let Some(prior) = prior.filter(|p| !p.is_null()) {
            schema.carry_computed(&prior, &mut planned)?;
            requires_replace = schema.changed_force_new(&prior, &planned);
            if !requires_replace.is_empty() {
                tracing::debug!(
                    "[provider] {} requires replacement: {:?}",
                    type_name,
                    requires_replace
                );
                schema.clear_computed(&mut planned)?;
            }
        }

        Ok(PlanResponse {
            planned_state: planned,
            requires_replace,
        })
    }

    #[tracing::instrument(skip(self, planned))]
    pub async fn create(&self, type_name: &str, planned: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        let mut planned = planned;
        schema.apply_defaults(&mut planned)?;
        schema.validate(&planned)?;

        let client = self.client().await?;
        resource.create(&client, planned).await
    }

    /// `None` when the remote object is gone.
    #[tracing::instrument(skip(self, current))]
    pub async fn read(&self, type_name: &str, current: Value) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(type_name)?;
        let client = self.client().await?;

        match resource.read(&client, current.clone()).await? {
            Some(mut state) => {
                resource.schema().carry_sensitive(&current, &mut state)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, prior, planned))]
    pub async fn update(
        &self,
        type_name: &str,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        let mut planned = planned;
        schema.apply_defaults(&mut planned)?;
        schema.validate(&planned)?;

        let client = self.client().await?;
        resource.update(&client, prior, planned).await
    }

    #[tracing::instrument(skip(self, current))]
    pub async fn delete(&self, type_name: &str, current: Value) -> Result<(), ProviderError> {
        let resource = self.resource(type_name)?;
        let client = self.client().await?;
        resource.delete(&client, current).await
    }

    /// State for an existing remote object, with schema defaults for the
    /// attributes the API does not report.
    #[tracing::instrument(skip(self))]
    pub async fn import(&self, type_name: &str, id: &str) -> Result<Value, ProviderError> {
        let resource = self.resource(type_name)?;
        if id.trim().is_empty() {
            return Err(ProviderError::ValidationError("import id is required".to_string()));
        }
        let client = self.client().await?;

        let mut state = resource.import(&client, id).await?;
        resource.schema().apply_defaults(&mut state)?;
        Ok(state)
    }

    #[tracing::instrument(skip(self, config))]
    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Result<Value, ProviderError> {
        let data_source = self.data_source(type_name)?;
        let schema = data_source.schema();
        let mut config = config;
        schema.apply_defaults(&mut config)?;
        schema.validate(&config)?;

        let client = self.client().await?;
        data_source.read(&client, config).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cyberark::http::{HttpClient, Session};
    use cyberark::{AccessToken, Endpoints, TokenScheme};
    use serde_json::json;

    #[test]
    fn test_schema_lists_every_type() {
        let schema = Provider::new().schema();
        assert_eq!(schema.resources.len(), 9);
        assert_eq!(schema.data_sources.len(), 3);
        assert!(schema.resources.contains_key("cyberark_sync_policy"));
        assert!(schema.data_sources.contains_key("cyberark_pam_source_store"));
        assert!(schema.provider.get("client_secret").unwrap().sensitive);
    }

    #[test]
    fn test_plan_fills_defaults() {
        let plan = Provider::new()
            .plan(
                "cyberark_safe",
                None,
                json!({"safe_name": "TF_SAFE", "member": "alice"}),
            )
            .unwrap();
        assert_eq!(plan.planned_state["retention"], 7);
        assert_eq!(plan.planned_state["permission_level"], "read");
        assert_eq!(plan.planned_state["member_type"], "User");
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn test_plan_in_place_update_keeps_computed() {
        let prior = json!({
            "id": "TF_SAFE", "safe_url_id": "TF_SAFE", "safe_number": 12,
            "safe_name": "TF_SAFE", "retention": 7, "member_type": "User",
            "permission_level": "read", "search_in": "Vault", "enable_secrets_hub": false
        });
        let plan = Provider::new()
            .plan(
                "cyberark_safe",
                Some(prior),
                json!({"safe_name": "TF_SAFE", "retention": 30}),
            )
            .unwrap();
        assert!(plan.requires_replace.is_empty());
        assert_eq!(plan.planned_state["safe_number"], 12);
        assert_eq!(plan.planned_state["id"], "TF_SAFE");
        assert_eq!(plan.planned_state["retention"], 30);
    }

    #[test]
    fn test_plan_replacement_clears_computed() {
        let prior = json!({
            "id": "TF_SAFE", "safe_url_id": "TF_SAFE", "safe_name": "TF_SAFE",
            "retention": 7, "member_type": "User", "permission_level": "read",
            "search_in": "Vault", "enable_secrets_hub": false
        });
        let plan = Provider::new()
            .plan(
                "cyberark_safe",
                Some(prior),
                json!({"safe_name": "TF_SAFE_2"}),
            )
            .unwrap();
        assert_eq!(plan.requires_replace, vec!["safe_name".to_string()]);
        assert_eq!(plan.planned_state["id"], Value::Null);
        assert_eq!(plan.planned_state["safe_url_id"], Value::Null);
    }

    #[test]
    fn test_plan_rejects_invalid_configuration() {
        let provider = Provider::new();
        assert!(matches!(
            provider.plan("cyberark_safe", None, json!({"retention": 7})),
            Err(ProviderError::ValidationError(_))
        ));
        assert!(matches!(
            provider.plan("cyberark_unknown", None, json!({})),
            Err(ProviderError::UnknownResource(_))
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_requires_configuration() {
        let provider = Provider::new();
        assert!(!provider.is_configured().await);

        let err = provider
            .read("cyberark_safe", json!({"safe_name": "TF_SAFE"}))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured);

        let err = provider
            .read_data_source("cyberark_pam_source_store", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured);
    }

    #[tokio::test]
    async fn test_unknown_type_wins_over_not_configured() {
        let err = Provider::new()
            .delete("cyberark_user", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::UnknownResource("cyberark_user".to_string()));

        let err = Provider::new()
            .read_data_source("cyberark_user", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::UnknownDataSource("cyberark_user".to_string()));
    }

    #[tokio::test]
    async fn test_configure_rejects_invalid_config_before_connecting() {
        let err = Provider::new()
            .configure(json!({
                "tenant": "abc", "domain": "bad domain",
                "client_id": "id", "client_secret": "secret"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ValidationError(_)));

        let err = Provider::new()
            .configure(json!({"tenant": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ValidationError(_)));
    }

    /// A configured client whose endpoints nothing listens on.
    fn offline_client() -> CyberArkClient {
        let unreachable = url::Url::parse("http://127.0.0.1:9/").unwrap();
        let http = HttpClient::new(Duration::from_secs(1), false).unwrap();
        let token = AccessToken::new("token", TokenScheme::Bearer, None);
        CyberArkClient::with_session(
            Session::new(http, token),
            Endpoints {
                identity: unreachable.clone(),
                pvwa: unreachable.clone(),
                secrets_hub: unreachable,
            },
        )
    }

    fn imported_account() -> Value {
        json!({
            "id": "12_3", "name": "aws-admin", "address": "aws.amazon.com",
            "username": "AKIAEXAMPLE", "platform": "AWSAccessKeys", "safe": "TF_SAFE",
            "secret_type": "key", "sm_manage": false,
            "aws_kid": "AKIAEXAMPLE", "aws_account_id": "123456789012"
        })
    }

    #[tokio::test]
    async fn test_update_records_secret_unknown_after_import() {
        let provider = Provider::with_client(offline_client());
        assert!(provider.is_configured().await);

        let prior = imported_account();
        let mut proposed = prior.clone();
        proposed["secret"] = json!("wJalrXUtnFEMI");
        let plan = provider
            .plan("cyberark_aws_account", Some(prior.clone()), proposed)
            .unwrap();
        assert!(plan.requires_replace.is_empty());

        let state = provider
            .update("cyberark_aws_account", prior, plan.planned_state)
            .await
            .unwrap();
        assert_eq!(state["id"], "12_3");
        assert_eq!(state["secret"], "wJalrXUtnFEMI");
    }

    #[tokio::test]
    async fn test_update_rejects_other_account_changes() {
        let provider = Provider::with_client(offline_client());
        let prior = imported_account();
        let mut planned = prior.clone();
        planned["secret"] = json!("wJalrXUtnFEMI");
        planned["username"] = json!("AKIAOTHER");

        let err = provider
            .update("cyberark_aws_account", prior, planned)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_import_requires_id() {
        let err = Provider::new()
            .import("cyberark_safe", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ValidationError(_)));
    }
}
