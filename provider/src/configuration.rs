// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::time::Duration;

use clap::Parser;
use cyberark::{AuthMethod, ClientConfig, Credentials, EndpointOverrides};
use serde::Deserialize;
use validator::Validate;
use zeroize::ZeroizeOnDrop;

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_DOMAIN, ENV_TENANT,
    MAX_TIMEOUT_SECONDS,
};
use crate::errors::ProviderError;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::validation::validate_dns_label;

/// Plugin host options.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ServeOptions {
    #[arg(long, default_value = "127.0.0.1", env("CYBERARK_PROVIDER_HOST"))]
    pub host: String,
    /// 0 picks a free port; the bound port is printed in the handshake line.
    #[arg(long, default_value = "0", env("CYBERARK_PROVIDER_PORT"))]
    pub port: u16,
    #[arg(long, default_value = "300", env("CYBERARK_PROVIDER_REQUEST_TIMEOUT"))]
    pub request_timeout_seconds: u64,
}

impl ServeOptions {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ServeOptions {
    fn default() -> Self {
        ServeOptions {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

/// The provider block of a configuration.
#[derive(Clone, Default, Deserialize, Validate, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    #[validate(custom(function = "validate_dns_label"))]
    pub tenant: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_dns_label"))]
    pub domain: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub client_id: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub client_secret: Option<String>,

    #[serde(default)]
    #[zeroize(skip)]
    pub auth_method: Option<String>,

    #[serde(default)]
    #[zeroize(skip)]
    #[validate(url)]
    pub identity_url: Option<String>,

    #[serde(default)]
    #[zeroize(skip)]
    #[validate(url)]
    pub pvwa_url: Option<String>,

    #[serde(default)]
    #[zeroize(skip)]
    #[validate(url)]
    pub secretshub_url: Option<String>,

    #[serde(default)]
    #[zeroize(skip)]
    pub debug: Option<bool>,

    #[serde(default)]
    #[zeroize(skip)]
    #[validate(range(min = 1, max = MAX_TIMEOUT_SECONDS))]
    pub timeout_seconds: Option<u64>,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("tenant", &self.tenant)
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("auth_method", &self.auth_method)
            .field("identity_url", &self.identity_url)
            .field("pvwa_url", &self.pvwa_url)
            .field("secretshub_url", &self.secretshub_url)
            .field("debug", &self.debug)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ProviderConfig {
    pub fn schema() -> Schema {
        Schema::new("CyberArk Privilege Cloud and Secrets Hub")
            .attribute(
                "tenant",
                Attribute::optional(AttributeType::String)
                    .describe(format!("Identity tenant ID. Falls back to {ENV_TENANT}.")),
            )
            .attribute(
                "domain",
                Attribute::optional(AttributeType::String)
                    .describe(format!("Privilege Cloud subdomain. Falls back to {ENV_DOMAIN}.")),
            )
            .attribute(
                "client_id",
                Attribute::optional(AttributeType::String)
                    .describe(format!("Service user name. Falls back to {ENV_CLIENT_ID}.")),
            )
            .attribute(
                "client_secret",
                Attribute::optional(AttributeType::String)
                    .sensitive()
                    .describe(format!("Service user secret. Falls back to {ENV_CLIENT_SECRET}.")),
            )
            .attribute(
                "auth_method",
                Attribute::optional(AttributeType::String)
                    .with_default("identity")
                    .describe("identity (OAuth2 platform token) or pvwa (PVWA logon)."),
            )
            .attribute("identity_url", Attribute::optional(AttributeType::String))
            .attribute("pvwa_url", Attribute::optional(AttributeType::String))
            .attribute("secretshub_url", Attribute::optional(AttributeType::String))
            .attribute(
                "debug",
                Attribute::optional(AttributeType::Bool)
                    .with_default(false)
                    .describe("Log request and response bodies. Secrets are redacted."),
            )
            .attribute("timeout_seconds", Attribute::optional(AttributeType::Number))
    }

    /// Fills unset credentials from `lookup` (the process environment in
    /// production).
    pub fn with_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn fill(field: &mut Option<String>, value: Option<String>) {
            if field.as_deref().is_none_or(str::is_empty) {
                *field = value.filter(|v| !v.is_empty());
            }
        }

        fill(&mut self.tenant, lookup(ENV_TENANT));
        fill(&mut self.domain, lookup(ENV_DOMAIN));
        fill(&mut self.client_id, lookup(ENV_CLIENT_ID));
        fill(&mut self.client_secret, lookup(ENV_CLIENT_SECRET));
        self
    }

    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|name| std::env::var(name).ok())
    }

    /// Validates the configuration and builds the client configuration.
    /// No network call happens here.
    pub fn client_config(&self) -> Result<ClientConfig, ProviderError> {
        self.validate()?;

        let tenant = required(&self.tenant, "tenant", ENV_TENANT)?;
        let domain = required(&self.domain, "domain", ENV_DOMAIN)?;
        let client_id = required(&self.client_id, "client_id", ENV_CLIENT_ID)?;
        let client_secret = required(&self.client_secret, "client_secret", ENV_CLIENT_SECRET)?;

        let mut config = ClientConfig::new(tenant, domain, Credentials::new(client_id, client_secret));
        if let Some(method) = &self.auth_method {
            config.auth_method = method
                .parse::<AuthMethod>()
                .map_err(|e| ProviderError::ValidationError(e.to_string()))?;
        }
        config.overrides = EndpointOverrides {
            identity: self.identity_url.clone(),
            pvwa: self.pvwa_url.clone(),
            secrets_hub: self.secretshub_url.clone(),
        };
        if let Some(seconds) = self.timeout_seconds {
            config.timeout = Duration::from_secs(seconds);
        }
        config.debug = self.debug.unwrap_or(false);

        // surface malformed endpoints before authenticating
        config
            .endpoints()
            .map_err(|e| ProviderError::ValidationError(e.to_string()))?;

        Ok(config)
    }
}

fn required<'a>(value: &'a Option<String>, name: &str, env: &str) -> Result<&'a str, ProviderError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProviderError::ValidationError(format!("{name} is required (or set {env})")))
}
