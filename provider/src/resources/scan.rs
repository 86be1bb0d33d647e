// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! `cyberark_secret_store_scan`: triggers a scan of a target store on
//! create. There is nothing to read back or delete; changing `triggers`
//! replaces the resource and so runs another scan.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use cyberark::CyberArkClient;
use serde_json::Value;

use crate::constants::SECRET_STORE_SCAN;
use crate::errors::ProviderError;
use crate::resources::{Resource, require_string};
use crate::schema::{Attribute, AttributeType, Schema, object_mut};

pub struct SecretStoreScanResource;

#[async_trait]
impl Resource for SecretStoreScanResource {
    fn type_name(&self) -> &'static str {
        SECRET_STORE_SCAN
    }

    fn schema(&self) -> Schema {
        Schema::new("On-demand scan of a Secrets Hub target store")
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute(
                "secret_store_id",
                Attribute::required(AttributeType::String).force_new(),
            )
            .attribute(
                "triggers",
                Attribute::optional(AttributeType::String)
                    .force_new()
                    .describe("Any change starts a new scan."),
            )
            .attribute(
                "scan_result",
                Attribute::computed(AttributeType::String)
                    .describe("Raw scan response, empty when Secrets Hub returned none."),
            )
    }

    #[tracing::instrument(skip(self, client, planned))]
    async fn create(&self, client: &CyberArkClient, planned: Value) -> Result<Value, ProviderError> {
        let store_id = require_string(&planned, "secret_store_id")?;
        let response = client.secrets_hub().trigger_scan(&store_id).await?;

        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let result = match response {
            Value::Null => String::new(),
            other => serde_json::to_string(&other)?,
        };

        let mut state = planned;
        let object = object_mut(&mut state)?;
        object.insert("id".to_string(), Value::from(format!("{store_id}/{started}")));
        object.insert("scan_result".to_string(), Value::from(result));
        Ok(state)
    }

    async fn read(&self, _client: &CyberArkClient, current: Value) -> Result<Option<Value>, ProviderError> {
        Ok(Some(current))
    }

    async fn delete(&self, _client: &CyberArkClient, current: Value) -> Result<(), ProviderError> {
        let id = current.get("id").and_then(Value::as_str).unwrap_or_default();
        tracing::debug!("[provider] forgetting scan {}", id);
        Ok(())
    }
}
