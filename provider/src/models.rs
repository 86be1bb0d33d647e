// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Request and response bodies of the plugin host API.
//!
//! State and configuration objects are plain JSON maps keyed by attribute
//! name; resources decode them into their own typed models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Diagnostic;

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigureRequest {
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub prior_state: Option<Value>,
    pub proposed_state: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub planned_state: Value,
    pub requires_replace: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub planned_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadRequest {
    pub current_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub prior_state: Value,
    pub planned_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub current_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceRequest {
    #[serde(default)]
    pub config: Value,
}

/// `new_state` is `null` when a read finds the remote object gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResponse {
    pub new_state: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub state: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceResponse {
    pub state: Value,
}
