// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the plugin host.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | GET | `/schema` | [`schema`] | Provider, resource and data source schemas |
//! | POST | `/configure` | [`configure`] | Authenticate against CyberArk |
//! | POST | `/resources/{type}/plan` | [`plan_resource`] | Plan a change |
//! | POST | `/resources/{type}/create` | [`create_resource`] | Create |
//! | POST | `/resources/{type}/read` | [`read_resource`] | Refresh |
//! | POST | `/resources/{type}/update` | [`update_resource`] | Update in place |
//! | POST | `/resources/{type}/delete` | [`delete_resource`] | Delete |
//! | POST | `/resources/{type}/import` | [`import_resource`] | Import by ID |
//! | POST | `/data-sources/{type}/read` | [`read_data_source`] | Read a data source |
//!
//! Failures are returned as `{"diagnostics": [...]}`, see
//! [`ProviderError`].

use std::sync::Arc;

use crate::application::AppState;
use crate::errors::ProviderError;
use crate::models::{
    ConfigureRequest, ConfigureResponse, CreateRequest, DataSourceRequest, DataSourceResponse,
    DeleteRequest, ImportRequest, ImportResponse, PlanRequest, PlanResponse, ReadRequest,
    StateResponse, UpdateRequest,
};
use crate::schema::ProviderSchema;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde_json::{Value, json};

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[tracing::instrument(skip(state))]
pub async fn schema(State(state): State<Arc<AppState>>) -> Json<ProviderSchema> {
    Json(state.provider.schema())
}

/// Validates the provider block and authenticates. Warnings come back as
/// diagnostics; errors as a non-2xx response.
#[tracing::instrument(skip(state, request))]
pub async fn configure(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfigureRequest>,
) -> Result<Json<ConfigureResponse>, ProviderError> {
    let diagnostics = state.provider.configure(request.config).await?;
    Ok(Json(ConfigureResponse { diagnostics }))
}

#[tracing::instrument(skip(state, request))]
pub async fn plan_resource(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ProviderError> {
    let plan = state
        .provider
        .plan(&type_name, request.prior_state, request.proposed_state)?;
    Ok(Json(plan))
}

#[tracing::instrument(skip(state, request))]
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<CreateRequest>,
) -> Result<Json<StateResponse>, ProviderError> {
    let new_state = state.provider.create(&type_name, request.planned_state).await?;
    Ok(Json(StateResponse {
        new_state: Some(new_state),
    }))
}

/// A `null` `new_state` tells the engine the object is gone.
#[tracing::instrument(skip(state, request))]
pub async fn read_resource(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<ReadRequest>,
) -> Result<Json<StateResponse>, ProviderError> {
    let new_state = state.provider.read(&type_name, request.current_state).await?;
    Ok(Json(StateResponse { new_state }))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<StateResponse>, ProviderError> {
    let new_state = state
        .provider
        .update(&type_name, request.prior_state, request.planned_state)
        .await?;
    Ok(Json(StateResponse {
        new_state: Some(new_state),
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>, ProviderError> {
    state.provider.delete(&type_name, request.current_state).await?;
    Ok(Json(json!({})))
}

#[tracing::instrument(skip(state, request))]
pub async fn import_resource(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ProviderError> {
    let imported = state.provider.import(&type_name, &request.id).await?;
    Ok(Json(ImportResponse { state: imported }))
}

#[tracing::instrument(skip(state, request))]
pub async fn read_data_source(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    Json(request): Json<DataSourceRequest>,
) -> Result<Json<DataSourceResponse>, ProviderError> {
    let result = state
        .provider
        .read_data_source(&type_name, request.config)
        .await?;
    Ok(Json(DataSourceResponse { state: result }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::configuration::ServeOptions;
    use crate::provider::Provider;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    // Unit tests for route handlers (testing handler functions directly)
    // Integration tests using TestServer are in tests/http_integration.rs

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            options: ServeOptions::default(),
            provider: Arc::new(Provider::new()),
        }))
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_schema_handler() {
        let Json(schema) = schema(state()).await;
        assert!(schema.resources.contains_key("cyberark_aws_account"));
        assert!(schema.data_sources.contains_key("cyberark_secret_store"));
    }

    #[tokio::test]
    async fn test_plan_handler_unknown_type() {
        let result = plan_resource(
            state(),
            Path("cyberark_nope".to_string()),
            Json(PlanRequest {
                prior_state: None,
                proposed_state: json!({}),
            }),
        )
        .await;
        assert_eq!(
            result.unwrap_err(),
            ProviderError::UnknownResource("cyberark_nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_handler_not_configured() {
        let result = create_resource(
            state(),
            Path("cyberark_secret_store_scan".to_string()),
            Json(CreateRequest {
                planned_state: json!({"secret_store_id": "store-1"}),
            }),
        )
        .await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }
}
