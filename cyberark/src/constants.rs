// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const USER_AGENT: &str = concat!("cyberark-provider/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `{tenant}` is the Identity tenant ID (e.g. `abc1234`)
pub const IDENTITY_URL_TEMPLATE: &str = "https://{tenant}.id.cyberark.cloud";
/// `{domain}` is the Privilege Cloud subdomain (e.g. `example`)
pub const PVWA_URL_TEMPLATE: &str = "https://{domain}.privilegecloud.cyberark.cloud/PasswordVault/API";
pub const SECRETS_HUB_URL_TEMPLATE: &str = "https://{domain}.secretshub.cyberark.cloud/api";

pub const PLATFORM_TOKEN_PATH: &[&str] = &["oauth2", "platformtoken"];
pub const PVWA_LOGON_PATH: &[&str] = &["auth", "Cyberark", "Logon", ""];
pub const PVWA_LOGOFF_PATH: &[&str] = &["auth", "Logoff", ""];

/// Some Secrets Hub endpoints (scans, GCP stores) are only served to clients
/// that opt into the beta API version.
pub const SECRETS_HUB_BETA_ACCEPT: &str = "application/x.secretshub.beta+json";

pub const DEFAULT_SEARCH_IN: &str = "Vault";
pub const DEFAULT_MEMBER_TYPE: &str = "User";
pub const DEFAULT_RETENTION_DAYS: u32 = 7;
pub const SECRETS_HUB_MEMBER: &str = "SecretsHub";
pub const PAM_SOURCE_STORE_TYPE: &str = "PAM_PCLOUD";
pub const PAM_SAFE_FILTER: &str = "PAM_SAFE";
pub const DEFAULT_TRANSFORMATION: &str = "password_only_plain_text";
pub const REDACTED: &str = "[REDACTED]";
