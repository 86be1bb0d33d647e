// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::{self, AuthMethod, Credentials, TokenScheme};
use crate::constants::{
    DEFAULT_TIMEOUT, IDENTITY_URL_TEMPLATE, PVWA_URL_TEMPLATE, SECRETS_HUB_URL_TEMPLATE,
};
use crate::errors::ApiError;
use crate::http::{HttpClient, Session};
use crate::pam::PamClient;
use crate::secretshub::SecretsHubClient;

/// Base URLs of the three CyberArk APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub identity: Url,
    pub pvwa: Url,
    pub secrets_hub: Url,
}

impl Endpoints {
    pub fn for_tenant(tenant: &str, domain: &str) -> Result<Self, ApiError> {
        Ok(Self {
            identity: Url::parse(&IDENTITY_URL_TEMPLATE.replace("{tenant}", tenant))?,
            pvwa: Url::parse(&PVWA_URL_TEMPLATE.replace("{domain}", domain))?,
            secrets_hub: Url::parse(&SECRETS_HUB_URL_TEMPLATE.replace("{domain}", domain))?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EndpointOverrides {
    pub identity: Option<String>,
    pub pvwa: Option<String>,
    pub secrets_hub: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub tenant: String,
    pub domain: String,
    pub credentials: Credentials,
    pub auth_method: AuthMethod,
    pub overrides: EndpointOverrides,
    pub timeout: Duration,
    pub debug: bool,
}

impl ClientConfig {
    pub fn new(tenant: impl Into<String>, domain: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            tenant: tenant.into(),
            domain: domain.into(),
            credentials,
            auth_method: AuthMethod::default(),
            overrides: EndpointOverrides::default(),
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        }
    }

    pub fn endpoints(&self) -> Result<Endpoints, ApiError> {
        let mut endpoints = Endpoints::for_tenant(&self.tenant, &self.domain)?;
        if let Some(identity) = &self.overrides.identity {
            endpoints.identity = Url::parse(identity)?;
        }
        if let Some(pvwa) = &self.overrides.pvwa {
            endpoints.pvwa = Url::parse(pvwa)?;
        }
        if let Some(secrets_hub) = &self.overrides.secrets_hub {
            endpoints.secrets_hub = Url::parse(secrets_hub)?;
        }
        Ok(endpoints)
    }
}

/// An authenticated client for PVWA and Secrets Hub.
///
/// Cloning is cheap; clones share the session.
#[derive(Debug, Clone)]
pub struct CyberArkClient {
    session: Arc<Session>,
    endpoints: Endpoints,
}

impl CyberArkClient {
    /// Authenticates with the configured method and returns a ready client.
    #[tracing::instrument(skip(config), fields(tenant = %config.tenant, domain = %config.domain))]
    pub async fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let endpoints = config.endpoints()?;
        let http = HttpClient::new(config.timeout, config.debug)?;

        tracing::info!(
            "[cyberark] authenticating with {:?} as {}",
            config.auth_method,
            config.credentials.client_id()
        );

        let token =
            auth::authenticate(&http, &endpoints, &config.credentials, config.auth_method).await?;

        Ok(Self {
            session: Arc::new(Session::new(http, token)),
            endpoints,
        })
    }

    /// Builds a client around an existing token, skipping authentication.
    pub fn with_session(session: Session, endpoints: Endpoints) -> Self {
        Self {
            session: Arc::new(session),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn pam(&self) -> PamClient<'_> {
        PamClient::new(&self.session, &self.endpoints.pvwa)
    }

    pub fn secrets_hub(&self) -> SecretsHubClient<'_> {
        SecretsHubClient::new(&self.session, &self.endpoints.secrets_hub)
    }

    /// Ends the PVWA session if this client holds one. Identity tokens simply
    /// expire.
    pub async fn close(&self) {
        if self.session.token().scheme() == TokenScheme::Raw {
            auth::pvwa_logoff(self.session.http(), &self.endpoints.pvwa, self.session.token()).await;
        }
    }
}
