// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # CyberArk client
//!
//! REST client for the three CyberArk APIs a Privilege Cloud / Secrets Hub
//! provider talks to.
//!
//! ```text
//! Provider -> CyberArkClient -> Identity   (oauth2/platformtoken)
//!                  |         -> PVWA       (Accounts, Safes, Members)
//!                  |         -> SecretsHub (secret-stores, scans, policies)
//!                  +-> Session (reqwest + AccessToken)
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: token exchange against Identity or PVWA, with zeroized secrets
//! - [`client`]: endpoint resolution and the authenticated [`CyberArkClient`]
//! - [`constants`]: URL templates and wire constants
//! - [`errors`]: [`ApiError`]
//! - [`http`]: request construction, auth headers, debug logging, response buffering
//! - [`models`]: request/response bodies
//! - [`pam`]: accounts, safes and safe members
//! - [`permissions`]: fixed permission bundles for named safe roles
//! - [`secretshub`]: secret stores, scans and sync policies
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), cyberark::ApiError> {
//! use cyberark::{ClientConfig, Credentials, CyberArkClient};
//!
//! let config = ClientConfig::new("abc1234", "example", Credentials::new("svc@example", "secret"));
//! let client = CyberArkClient::connect(&config).await?;
//! let safe = client.pam().get_safe("TF_SAFE").await?;
//! # Ok(())
//! # }
//! ```
//!
//! There is no retry, caching or token refresh: a client lives for one
//! provider configuration.

pub mod auth;
pub mod client;
pub mod constants;
pub mod errors;
pub mod http;
pub mod models;
pub mod pam;
pub mod permissions;
pub mod secretshub;

pub use auth::{AccessToken, AuthMethod, Credentials, TokenScheme};
pub use client::{ClientConfig, CyberArkClient, EndpointOverrides, Endpoints};
pub use errors::ApiError;
pub use permissions::{PermissionLevel, SafePermissions};
