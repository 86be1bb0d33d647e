// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! PVWA client for accounts, safes and safe members.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/Accounts/` | [`PamClient::create_account`] |
//! | GET | `/Accounts/{id}/` | [`PamClient::get_account`] |
//! | GET | `/Accounts?search=&filter=` | [`PamClient::find_accounts`] |
//! | DELETE | `/Accounts/{id}/` | [`PamClient::delete_account`] |
//! | POST | `/Safes/` | [`PamClient::create_safe`] |
//! | GET | `/Safes/{name}/` | [`PamClient::get_safe`] |
//! | PUT | `/Safes/{name}/` | [`PamClient::update_safe`] |
//! | DELETE | `/Safes/{name}/` | [`PamClient::delete_safe`] |
//! | POST | `/Safes/{name}/Members/` | [`PamClient::add_safe_member`] |
//! | GET | `/Safes/{name}/Members/{member}/` | [`PamClient::get_safe_member`] |
//! | DELETE | `/Safes/{name}/Members/{member}/` | [`PamClient::remove_safe_member`] |
//!
//! Creates that hit HTTP 409 resolve to the object that already exists.

use reqwest::Method;
use url::Url;

use crate::errors::ApiError;
use crate::http::{Session, endpoint};
use crate::models::{Account, AccountList, NewAccount, NewSafeMember, Safe, SafeMember, SafeRequest};

pub struct PamClient<'a> {
    session: &'a Session,
    base: &'a Url,
}

impl<'a> PamClient<'a> {
    pub fn new(session: &'a Session, base: &'a Url) -> Self {
        Self { session, base }
    }

    // ==================== Accounts ====================

    #[tracing::instrument(skip(self, account), fields(safe = %account.safe_name))]
    pub async fn create_account(&self, account: &NewAccount) -> Result<Account, ApiError> {
        let url = endpoint(self.base, &["Accounts", ""])?;
        let request = self.session.request(Method::POST, url)?;
        // the body carries the account secret
        let response = self.session.send(request, Some(account), true).await?;

        if response.is_conflict() {
            tracing::warn!(
                "[cyberark] account {:?} already exists in safe {}",
                account.name,
                account.safe_name
            );
            return self.existing_account(account).await;
        }

        let created: Account = response.error_for_status()?.json()?;
        tracing::info!("[cyberark] created account {}", created.id);
        Ok(created)
    }

    async fn existing_account(&self, account: &NewAccount) -> Result<Account, ApiError> {
        let search = account.name.as_deref().unwrap_or(&account.user_name);
        let matches = self.find_accounts(Some(search), Some(&account.safe_name)).await?;

        matches
            .into_iter()
            .find(|existing| match &account.name {
                Some(name) => existing.name.as_deref() == Some(name.as_str()),
                None => {
                    existing.user_name.as_deref() == Some(account.user_name.as_str())
                        && existing.address.as_deref() == Some(account.address.as_str())
                }
            })
            .ok_or_else(|| {
                ApiError::Conflict(format!(
                    "account {search} exists in safe {} but could not be resolved",
                    account.safe_name
                ))
            })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, ApiError> {
        let url = endpoint(self.base, &["Accounts", id, ""])?;
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_accounts(
        &self,
        search: Option<&str>,
        safe_name: Option<&str>,
    ) -> Result<Vec<Account>, ApiError> {
        let mut url = endpoint(self.base, &["Accounts"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(search) = search {
                query.append_pair("search", search);
            }
            if let Some(safe_name) = safe_name {
                query.append_pair("filter", &format!("safeName eq {safe_name}"));
            }
        }
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        let list: AccountList = response.error_for_status()?.json()?;
        Ok(list.value)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_account(&self, id: &str) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["Accounts", id, ""])?;
        let response = self.session.execute(self.session.request(Method::DELETE, url)?).await?;
        if response.is_not_found() {
            tracing::warn!("[cyberark] account {} already deleted", id);
            return Ok(());
        }
        response.error_for_status()?;
        tracing::info!("[cyberark] deleted account {}", id);
        Ok(())
    }

    // ==================== Safes ====================

    #[tracing::instrument(skip(self, safe), fields(safe = %safe.safe_name))]
    pub async fn create_safe(&self, safe: &SafeRequest) -> Result<Safe, ApiError> {
        let url = endpoint(self.base, &["Safes", ""])?;
        let request = self.session.request(Method::POST, url)?;
        let response = self.session.send(request, Some(safe), false).await?;

        if response.is_conflict() {
            tracing::warn!("[cyberark] safe {} already exists", safe.safe_name);
            return self
                .get_safe(&safe.safe_name)
                .await?
                .ok_or_else(|| ApiError::Conflict(format!("safe {} exists but is not visible", safe.safe_name)));
        }

        let created: Safe = response.error_for_status()?.json()?;
        tracing::info!("[cyberark] created safe {}", created.safe_name);
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_safe(&self, safe_name: &str) -> Result<Option<Safe>, ApiError> {
        let url = endpoint(self.base, &["Safes", safe_name, ""])?;
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    #[tracing::instrument(skip(self, safe))]
    pub async fn update_safe(&self, safe_url_id: &str, safe: &SafeRequest) -> Result<Safe, ApiError> {
        let url = endpoint(self.base, &["Safes", safe_url_id, ""])?;
        let request = self.session.request(Method::PUT, url)?;
        let response = self.session.send(request, Some(safe), false).await?;
        let updated: Safe = response.error_for_status()?.json()?;
        tracing::info!("[cyberark] updated safe {}", updated.safe_name);
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_safe(&self, safe_url_id: &str) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["Safes", safe_url_id, ""])?;
        let response = self.session.execute(self.session.request(Method::DELETE, url)?).await?;
        if response.is_not_found() {
            tracing::warn!("[cyberark] safe {} already deleted", safe_url_id);
            return Ok(());
        }
        response.error_for_status()?;
        tracing::info!("[cyberark] deleted safe {}", safe_url_id);
        Ok(())
    }

    // ==================== Safe members ====================

    #[tracing::instrument(skip(self, member), fields(member = %member.member_name))]
    pub async fn add_safe_member(
        &self,
        safe_url_id: &str,
        member: &NewSafeMember,
    ) -> Result<SafeMember, ApiError> {
        let url = endpoint(self.base, &["Safes", safe_url_id, "Members", ""])?;
        let request = self.session.request(Method::POST, url)?;
        let response = self.session.send(request, Some(member), false).await?;

        if response.is_conflict() {
            tracing::warn!(
                "[cyberark] {} is already a member of safe {}",
                member.member_name,
                safe_url_id
            );
            return self
                .get_safe_member(safe_url_id, &member.member_name)
                .await?
                .ok_or_else(|| {
                    ApiError::Conflict(format!(
                        "{} is a member of safe {} but is not visible",
                        member.member_name, safe_url_id
                    ))
                });
        }

        let added: SafeMember = response.error_for_status()?.json()?;
        tracing::info!(
            "[cyberark] added {} to safe {}",
            added.member_name,
            safe_url_id
        );
        Ok(added)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_safe_member(
        &self,
        safe_url_id: &str,
        member_name: &str,
    ) -> Result<Option<SafeMember>, ApiError> {
        let url = endpoint(self.base, &["Safes", safe_url_id, "Members", member_name, ""])?;
        let response = self.session.execute(self.session.request(Method::GET, url)?).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_safe_member(&self, safe_url_id: &str, member_name: &str) -> Result<(), ApiError> {
        let url = endpoint(self.base, &["Safes", safe_url_id, "Members", member_name, ""])?;
        let response = self.session.execute(self.session.request(Method::DELETE, url)?).await?;
        if response.is_not_found() {
            return Ok(());
        }
        response.error_for_status()?;
        tracing::info!("[cyberark] removed {} from safe {}", member_name, safe_url_id);
        Ok(())
    }
}
