// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const HANDSHAKE_PREFIX: &str = "CYBERARK_PROVIDER";
pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1 MB
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

// Provider configuration environment fallbacks
pub const ENV_TENANT: &str = "CYBERARK_TENANT";
pub const ENV_DOMAIN: &str = "CYBERARK_DOMAIN";
pub const ENV_CLIENT_ID: &str = "CYBERARK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CYBERARK_CLIENT_SECRET";

// Resource and data source type names
pub const AWS_ACCOUNT: &str = "cyberark_aws_account";
pub const AZURE_ACCOUNT: &str = "cyberark_azure_account";
pub const DB_ACCOUNT: &str = "cyberark_db_account";
pub const SAFE: &str = "cyberark_safe";
pub const AWS_SECRET_STORE: &str = "cyberark_aws_secret_store";
pub const AZURE_SECRET_STORE: &str = "cyberark_azure_secret_store";
pub const GCP_SECRET_STORE: &str = "cyberark_gcp_secret_store";
pub const SECRET_STORE_SCAN: &str = "cyberark_secret_store_scan";
pub const SYNC_POLICY: &str = "cyberark_sync_policy";
pub const SECRET_STORE: &str = "cyberark_secret_store";
pub const PAM_SOURCE_STORE: &str = "cyberark_pam_source_store";

// Validation constants
pub const MAX_SAFE_NAME_LENGTH: u64 = 28;
pub const MAX_DESCRIPTION_LENGTH: u64 = 100;
pub const MAX_NAME_LENGTH: u64 = 255;
pub const MAX_RETENTION_DAYS: u32 = 3650;
pub const MAX_TIMEOUT_SECONDS: u64 = 600;
pub const SAFE_NAME_FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\t', '\r', '\n'];
