// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Token exchange against CyberArk Identity or the PVWA logon endpoint.
//!
//! # Security
//!
//! - [`Credentials`], [`AccessToken`] and the intermediate response bodies are
//!   zeroized on drop
//! - `Debug` output never contains secret material
//! - Login request and response bodies are flagged sensitive so debug logging
//!   redacts them

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::ZeroizeOnDrop;

use crate::client::Endpoints;
use crate::constants::{PLATFORM_TOKEN_PATH, PVWA_LOGOFF_PATH, PVWA_LOGON_PATH};
use crate::errors::ApiError;
use crate::http::{HttpClient, endpoint};

#[derive(Clone, ZeroizeOnDrop)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// OAuth2 client credentials against the Identity tenant.
    #[default]
    Identity,
    /// Username/password logon against PVWA.
    Pvwa,
}

impl FromStr for AuthMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" => Ok(Self::Identity),
            "pvwa" => Ok(Self::Pvwa),
            other => Err(ApiError::ConfigError(format!(
                "unknown auth method {other:?}, expected \"identity\" or \"pvwa\""
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: <token>`, as PVWA session tokens are sent
    Raw,
}

#[derive(Clone, ZeroizeOnDrop)]
pub struct AccessToken {
    value: String,
    #[zeroize(skip)]
    scheme: TokenScheme,
    #[zeroize(skip)]
    expires_in: Option<Duration>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, scheme: TokenScheme, expires_in: Option<Duration>) -> Self {
        Self {
            value: value.into(),
            scheme,
            expires_in,
        }
    }

    pub fn scheme(&self) -> TokenScheme {
        self.scheme
    }

    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn header_value(&self) -> Result<HeaderValue, ApiError> {
        let raw = match self.scheme {
            TokenScheme::Bearer => format!("Bearer {}", self.value),
            TokenScheme::Raw => self.value.clone(),
        };
        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| ApiError::AuthError("token contains invalid header characters".to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize, ZeroizeOnDrop)]
struct PlatformTokenResponse {
    access_token: String,
    #[serde(default)]
    #[zeroize(skip)]
    expires_in: Option<u64>,
}

#[derive(Serialize, ZeroizeOnDrop)]
struct LogonRequest {
    username: String,
    password: String,
    #[serde(rename = "concurrentSession")]
    #[zeroize(skip)]
    concurrent_session: bool,
}

/// Exchanges client credentials for a platform token.
///
/// `POST {identity}/oauth2/platformtoken` with a form encoded
/// `client_credentials` grant.
#[tracing::instrument(skip(http, credentials))]
pub async fn platform_token(
    http: &HttpClient,
    identity_url: &Url,
    credentials: &Credentials,
) -> Result<AccessToken, ApiError> {
    let url = endpoint(identity_url, PLATFORM_TOKEN_PATH)?;

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id()),
        ("client_secret", credentials.client_secret()),
    ];
    let request = http.request(Method::POST, url).form(&form);

    let response = http.send::<()>(request, None, true).await?;
    if !response.is_success() {
        tracing::error!(
            "[cyberark] identity token request rejected with status {}",
            response.status.as_u16()
        );
        return Err(ApiError::AuthError(format!(
            "identity returned {}: {}",
            response.status.as_u16(),
            response.text()
        )));
    }

    let mut payload: PlatformTokenResponse = response.json()?;
    if payload.access_token.is_empty() {
        return Err(ApiError::AuthError("identity returned an empty token".to_string()));
    }

    let expires_in = payload.expires_in.map(Duration::from_secs);
    let token = AccessToken::new(
        std::mem::take(&mut payload.access_token),
        TokenScheme::Bearer,
        expires_in,
    );

    tracing::debug!("[cyberark] obtained identity token, expires_in: {:?}", expires_in);

    Ok(token)
}

/// Logs on to PVWA and returns the session token.
///
/// The response body is a bare JSON string.
#[tracing::instrument(skip(http, credentials))]
pub async fn pvwa_logon(
    http: &HttpClient,
    pvwa_url: &Url,
    credentials: &Credentials,
) -> Result<AccessToken, ApiError> {
    let url = endpoint(pvwa_url, PVWA_LOGON_PATH)?;
    let body = LogonRequest {
        username: credentials.client_id().to_string(),
        password: credentials.client_secret().to_string(),
        concurrent_session: true,
    };

    let request = http.request(Method::POST, url);
    let response = http.send(request, Some(&body), true).await?;
    if !response.is_success() {
        tracing::error!(
            "[cyberark] pvwa logon rejected with status {}",
            response.status.as_u16()
        );
        return Err(ApiError::AuthError(format!(
            "pvwa returned {}: {}",
            response.status.as_u16(),
            response.text()
        )));
    }

    let token: String = response.json()?;
    let token = AccessToken::new(token, TokenScheme::Raw, None);
    if token.secret().is_empty() {
        return Err(ApiError::AuthError("pvwa returned an empty token".to_string()));
    }

    tracing::debug!("[cyberark] obtained pvwa session token");

    Ok(token)
}

/// Obtains a token with `method`.
pub async fn authenticate(
    http: &HttpClient,
    endpoints: &Endpoints,
    credentials: &Credentials,
    method: AuthMethod,
) -> Result<AccessToken, ApiError> {
    match method {
        AuthMethod::Identity => platform_token(http, &endpoints.identity, credentials).await,
        AuthMethod::Pvwa => pvwa_logon(http, &endpoints.pvwa, credentials).await,
    }
}

/// Ends a PVWA session. Failures are logged and otherwise ignored.
#[tracing::instrument(skip(http, token))]
pub async fn pvwa_logoff(http: &HttpClient, pvwa_url: &Url, token: &AccessToken) {
    let result = async {
        let url = endpoint(pvwa_url, PVWA_LOGOFF_PATH)?;
        let request = http
            .request(Method::POST, url)
            .header(reqwest::header::AUTHORIZATION, token.header_value()?);
        http.send::<()>(request, None, false).await?.error_for_status()
    }
    .await;

    if let Err(e) = result {
        tracing::warn!("[cyberark] pvwa logoff failed: {}", e);
    }
}
