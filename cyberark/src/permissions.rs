// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Fixed safe member permission bundles.
//!
//! PVWA expects the full permission block on every member request. Rather
//! than exposing 22 booleans to configuration, members are added with a
//! named [`PermissionLevel`] which expands to a fixed [`SafePermissions`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafePermissions {
    pub use_accounts: bool,
    pub retrieve_accounts: bool,
    pub list_accounts: bool,
    pub add_accounts: bool,
    pub update_account_content: bool,
    pub update_account_properties: bool,
    #[serde(rename = "initiateCPMAccountManagementOperations")]
    pub initiate_cpm_account_management_operations: bool,
    pub specify_next_account_content: bool,
    pub rename_accounts: bool,
    pub delete_accounts: bool,
    pub unlock_accounts: bool,
    pub manage_safe: bool,
    pub manage_safe_members: bool,
    pub backup_safe: bool,
    pub view_audit_log: bool,
    pub view_safe_members: bool,
    pub access_without_confirmation: bool,
    pub create_folders: bool,
    pub delete_folders: bool,
    pub move_accounts_and_folders: bool,
    #[serde(rename = "requestsAuthorizationLevel1")]
    pub requests_authorization_level1: bool,
    #[serde(rename = "requestsAuthorizationLevel2")]
    pub requests_authorization_level2: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    Full,
    ReadOnly,
    Approver,
    Manager,
    SecretsHub,
    Cpm,
}

pub const PERMISSION_LEVEL_NAMES: &[&str] = &[
    "full",
    "admin",
    "read",
    "read_only",
    "approver",
    "manager",
    "accounts_manager",
    "secrets_hub",
    "cpm",
    "service",
];

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::ReadOnly => "read",
            Self::Approver => "approver",
            Self::Manager => "manager",
            Self::SecretsHub => "secrets_hub",
            Self::Cpm => "cpm",
        }
    }

    pub fn permissions(&self) -> SafePermissions {
        match self {
            Self::Full => SafePermissions {
                use_accounts: true,
                retrieve_accounts: true,
                list_accounts: true,
                add_accounts: true,
                update_account_content: true,
                update_account_properties: true,
                initiate_cpm_account_management_operations: true,
                specify_next_account_content: true,
                rename_accounts: true,
                delete_accounts: true,
                unlock_accounts: true,
                manage_safe: true,
                manage_safe_members: true,
                backup_safe: true,
                view_audit_log: true,
                view_safe_members: true,
                access_without_confirmation: true,
                create_folders: true,
                delete_folders: true,
                move_accounts_and_folders: true,
                requests_authorization_level1: true,
                requests_authorization_level2: false,
            },
            Self::ReadOnly => SafePermissions {
                use_accounts: true,
                retrieve_accounts: true,
                list_accounts: true,
                view_audit_log: true,
                view_safe_members: true,
                ..SafePermissions::default()
            },
            Self::Approver => SafePermissions {
                list_accounts: true,
                view_safe_members: true,
                manage_safe_members: true,
                requests_authorization_level1: true,
                ..SafePermissions::default()
            },
            Self::Manager => SafePermissions {
                use_accounts: true,
                retrieve_accounts: true,
                list_accounts: true,
                add_accounts: true,
                update_account_content: true,
                update_account_properties: true,
                initiate_cpm_account_management_operations: true,
                specify_next_account_content: true,
                rename_accounts: true,
                delete_accounts: true,
                unlock_accounts: true,
                manage_safe_members: true,
                view_audit_log: true,
                view_safe_members: true,
                create_folders: true,
                delete_folders: true,
                move_accounts_and_folders: true,
                requests_authorization_level1: true,
                ..SafePermissions::default()
            },
            Self::SecretsHub => SafePermissions {
                retrieve_accounts: true,
                list_accounts: true,
                view_safe_members: true,
                ..SafePermissions::default()
            },
            Self::Cpm => SafePermissions {
                use_accounts: true,
                retrieve_accounts: true,
                list_accounts: true,
                add_accounts: true,
                update_account_content: true,
                update_account_properties: true,
                initiate_cpm_account_management_operations: true,
                delete_accounts: true,
                unlock_accounts: true,
                view_safe_members: true,
                access_without_confirmation: true,
                ..SafePermissions::default()
            },
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "admin" => Ok(Self::Full),
            "read" | "read_only" => Ok(Self::ReadOnly),
            "approver" => Ok(Self::Approver),
            "manager" | "accounts_manager" => Ok(Self::Manager),
            "secrets_hub" => Ok(Self::SecretsHub),
            "cpm" | "service" => Ok(Self::Cpm),
            other => Err(ApiError::ConfigError(format!(
                "unknown permission level {other:?}, expected one of: {}",
                PERMISSION_LEVEL_NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
