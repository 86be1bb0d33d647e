// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Secrets Hub client for secret stores, scans and sync policies.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/secret-stores` | [`SecretsHubClient::create_secret_store`] |
//! | GET | `/secret-stores?behavior=` | [`SecretsHubClient::list_secret_stores`] |
//! | GET | `/secret-stores/{id}` | [`SecretsHubClient::get_secret_store`] |
//! | PUT | `/secret-stores/{id}/state` | [`SecretsHubClient::set_secret_store_state`] |
//! | DELETE | `/secret-stores/{id}` | [`SecretsHubClient::delete_secret_store`] |
//! | POST | `/scan-definitions/secret-stores/{id}/scan` | [`SecretsHubClient::trigger_scan`] |
//! | POST | `/policies` | [`SecretsHubClient::create_sync_policy`] |
//! | GET | `/policies` | [`SecretsHubClient::list_sync_policies`] |
//! | GET | `/policies/{id}` | [`SecretsHubClient::get_sync_policy`] |
//! | PUT | `/policies/{id}/state` | [`SecretsHubClient::set_sync_policy_state`] |
//! | DELETE | `/policies/{id}` | [`SecretsHubClient::delete_sync_policy`], [`SecretsHubClient::remove_sync_policy`] |

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::constants::{PAM_SOURCE_STORE_TYPE, SECRETS_HUB_BETA_ACCEPT};
use crate::errors::ApiError;
use crate::http::{Session, endpoint};
use crate::models::{
    NewSecretStore, NewSyncPolicy, SecretStore, SecretStoreList, SecretStoreType, StateAction,
    StateChange, StoreBehavior, SyncPolicy, SyncPolicyList,
};

pub struct SecretsHubClient<'a> {
    session: &'a Session,
    base: &'a Url,
}

impl<'a> SecretsHubClient<'a> {
    pub fn new(session: &'a Session, base: &'a Url) -> Self {
        Self { session, base }
    }

    // ==================== Secret stores ====================

    #[tracing::instrument(skip(self, store), fields(name = %store.name, store_type = store.store_type.as_str()))]
    pub async fn create_secret_store(&self, store: &NewSecretStore) -> Result<SecretStore, ApiError> {
        let url = endpoint(self.base, &["secret-stores"])?;
        let request = if store.store_type == SecretStoreType::GcpGsm {
            self.session
                .request_accepting(Method::POST, url, SECRETS_HUB_BETA_ACCEPT)?
        } else {
            self.session.request(Method::POST, url)?
        };
        let response = self
            .session
            .send(request, Some(store), store.is_sensitive())
            .await?;

        if response.is_conflict() {
            tracing::warn!("[cyberark] secret store {} already exists", store.name);
            let existing = self.list_secret_stores(Some(StoreBehavior::SecretsTarget)).await?;
            return existing
                .into_iter()
                .find(|s| s.name == store.name && s.kind() == Some(store.store_type))
                .ok_or_else(|| {
                    ApiError::Conflict(format!(
                        "secret store {} conflicts with an existing store",
                        store.name
                    ))
                });
        }

        let created: SecretStore = response.error_for_status()?.json()?;
        tracing::info!("[cyberark] created secret store {}", created.id);
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_secret_store(&self, id: &str) -> Result<Option<SecretStore>, ApiError> {
        let url = endpoint(self.base, &["secret-stores", id])?;
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_secret_stores(
        &self,
        behavior: Option<StoreBehavior>,
    ) -> Result<Vec<SecretStore>, ApiError> {
        let mut url = endpoint(self.base, &["secret-stores"])?;
        if let Some(behavior) = behavior {
            url.query_pairs_mut().append_pair("behavior", behavior.as_str());
        }
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        let list: SecretStoreList = response.error_for_status()?.json()?;
        Ok(list.secret_stores)
    }

    /// The Privilege Cloud store every sync policy reads from.
    #[tracing::instrument(skip(self))]
    pub async fn pam_source_store(&self) -> Result<SecretStore, ApiError> {
        self.list_secret_stores(Some(StoreBehavior::SecretsSource))
            .await?
            .into_iter()
            .find(|s| s.store_type == PAM_SOURCE_STORE_TYPE)
            .ok_or_else(|| ApiError::NotFound("PAM source secret store".to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_secret_store_state(&self, id: &str, action: StateAction) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["secret-stores", id, "state"])?;
        let request = self.session.request(Method::PUT, url)?;
        self.session
            .send(request, Some(&StateChange { action }), false)
            .await?
            .error_for_status()?;
        tracing::info!("[cyberark] secret store {} state -> {:?}", id, action);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_secret_store(&self, id: &str) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["secret-stores", id])?;
        let response = self.session.execute(self.session.request(Method::DELETE, url)?).await?;
        if response.is_not_found() {
            tracing::warn!("[cyberark] secret store {} already deleted", id);
            return Ok(());
        }
        response.error_for_status()?;
        tracing::info!("[cyberark] deleted secret store {}", id);
        Ok(())
    }

    // ==================== Scans ====================

    /// Triggers a scan of a target store. The response body is optional and
    /// returned as-is.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_scan(&self, store_id: &str) -> Result<Value, ApiError> {
        let url = endpoint(self.base, &["scan-definitions", "secret-stores", store_id, "scan"])?;
        let request = self
            .session
            .request_accepting(Method::POST, url, SECRETS_HUB_BETA_ACCEPT)?;
        let response = self.session.execute(request).await?.error_for_status()?;
        tracing::info!("[cyberark] triggered scan of secret store {}", store_id);
        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        response.json()
    }

    // ==================== Sync policies ====================

    #[tracing::instrument(skip(self, policy), fields(name = %policy.name))]
    pub async fn create_sync_policy(&self, policy: &NewSyncPolicy) -> Result<SyncPolicy, ApiError> {
        let url = endpoint(self.base, &["policies"])?;
        let request = self.session.request(Method::POST, url)?;
        let response = self.session.send(request, Some(policy), false).await?;

        if response.is_conflict() {
            tracing::warn!("[cyberark] sync policy {} already exists", policy.name);
            return self
                .list_sync_policies()
                .await?
                .into_iter()
                .find(|p| p.name == policy.name)
                .ok_or_else(|| {
                    ApiError::Conflict(format!(
                        "sync policy {} conflicts with an existing policy",
                        policy.name
                    ))
                });
        }

        let created: SyncPolicy = response.error_for_status()?.json()?;
        tracing::info!("[cyberark] created sync policy {}", created.id);
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_sync_policy(&self, id: &str) -> Result<Option<SyncPolicy>, ApiError> {
        let url = endpoint(self.base, &["policies", id])?;
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_sync_policies(&self) -> Result<Vec<SyncPolicy>, ApiError> {
        let url = endpoint(self.base, &["policies"])?;
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        let list: SyncPolicyList = response.error_for_status()?.json()?;
        Ok(list.policies)
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_sync_policy_state(&self, id: &str, action: StateAction) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["policies", id, "state"])?;
        let request = self.session.request(Method::PUT, url)?;
        self.session
            .send(request, Some(&StateChange { action }), false)
            .await?
            .error_for_status()?;
        tracing::info!("[cyberark] sync policy {} state -> {:?}", id, action);
        Ok(())
    }

    /// Disables then deletes a policy; Secrets Hub refuses to delete an
    /// enabled one.
    #[tracing::instrument(skip(self))]
    pub async fn delete_sync_policy(&self, id: &str) -> Result<(), ApiError> {
        match self.set_sync_policy_state(id, StateAction::Disable).await {
            Ok(()) => {}
            Err(ApiError::NotFound(_)) => {
                tracing::warn!("[cyberark] sync policy {} already deleted", id);
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        self.remove_sync_policy(id).await
    }

    /// Deletes a policy that is already disabled.
    #[tracing::instrument(skip(self))]
    pub async fn remove_sync_policy(&self, id: &str) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["policies", id])?;
        let response = self.session.execute(self.session.request(Method::DELETE, url)?).await?;
        if response.is_not_found() {
            tracing::warn!("[cyberark] sync policy {} already deleted", id);
            return Ok(());
        }
        response.error_for_status()?;
        tracing::info!("[cyberark] deleted sync policy {}", id);
        Ok(())
    }
}
