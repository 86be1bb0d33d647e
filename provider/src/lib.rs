// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # CyberArk provider
//!
//! Infrastructure-as-code provider for CyberArk Privilege Cloud and Secrets
//! Hub, served to the engine as a local HTTP plugin.
//!
//! ```text
//! Engine --HTTP/JSON--> routes --> Provider --> Resource / DataSource
//!                                     |               |
//!                                     +-- Schema      +--> cyberark::CyberArkClient
//! ```
//!
//! On start the binary binds a local port and prints
//! `CYBERARK_PROVIDER|1|<host>:<port>` on stdout; everything else (logs)
//! goes to stderr.
//!
//! ## Modules
//!
//! - [`application`]: router, middleware and server lifecycle
//! - [`configuration`]: command line options and the provider block
//! - [`constants`]: type names, limits and environment variable names
//! - [`data_sources`]: read-only lookups
//! - [`errors`]: [`errors::ProviderError`] and its diagnostics response
//! - [`models`]: plugin API request and response bodies
//! - [`provider`]: lifecycle dispatch and planning
//! - [`resources`]: managed resource types
//! - [`routes`]: HTTP handlers
//! - [`schema`]: attribute schemas
//! - [`validation`]: field validators

pub mod application;
pub mod configuration;
pub mod constants;
pub mod data_sources;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resources;
pub mod routes;
pub mod schema;
pub mod validation;
