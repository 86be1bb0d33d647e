// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cyberark::ApiError;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProviderError {
    #[error("provider is not configured")]
    NotConfigured,
    #[error("unknown resource type: {0}")]
    UnknownResource(String),
    #[error("unknown data source: {0}")]
    UnknownDataSource(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("CyberArk API error: {0}")]
    Api(#[from] ApiError),
    #[error("internal server error")]
    InternalServerError,
}

impl ProviderError {
    pub fn unsupported(type_name: &str, operation: &str) -> Self {
        Self::Unsupported(format!("{type_name} does not support {operation}"))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::PRECONDITION_FAILED,
            Self::UnknownResource(_)
            | Self::UnknownDataSource(_)
            | Self::ValidationError(_)
            | Self::Unsupported(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::Api(ApiError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::ConfigError(_)) => StatusCode::BAD_REQUEST,
            Self::Api(ApiError::AuthError(_)) => StatusCode::UNAUTHORIZED,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Self::NotConfigured => "Provider not configured",
            Self::UnknownResource(_) => "Unknown resource type",
            Self::UnknownDataSource(_) => "Unknown data source",
            Self::ValidationError(_) => "Invalid configuration",
            Self::Unsupported(_) => "Unsupported operation",
            Self::NotFound(_) | Self::Api(ApiError::NotFound(_)) => "Not found",
            Self::Api(_) => "CyberArk API error",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        Self {
            severity: Severity::Error,
            summary: err.summary().to_string(),
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[provider] {}", self);
        } else {
            tracing::warn!("[provider] {}", self);
        }

        let body = Json(serde_json::json!({"diagnostics": [Diagnostic::from(&self)]}));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(_source: serde_json::Error) -> Self {
        tracing::error!("{:?}", _source);
        ProviderError::InternalServerError
    }
}

impl From<validator::ValidationErrors> for ProviderError {
    fn from(source: validator::ValidationErrors) -> Self {
        ProviderError::ValidationError(source.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ProviderError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_not_configured_is_precondition_failed() {
        let (status, body) = body_of(ProviderError::NotConfigured).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["diagnostics"][0]["severity"], "error");
        assert_eq!(body["diagnostics"][0]["summary"], "Provider not configured");
    }

    #[tokio::test]
    async fn test_unsupported_detail() {
        let (status, body) =
            body_of(ProviderError::unsupported("cyberark_aws_account", "update")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["diagnostics"][0]["detail"],
            "cyberark_aws_account does not support update"
        );
    }

    #[tokio::test]
    async fn test_upstream_errors_are_bad_gateway() {
        let err = ProviderError::Api(ApiError::StatusError {
            status: 500,
            url: "https://example/api/policies".to_string(),
            body: "boom".to_string(),
        });
        let (status, _) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_auth_errors_are_unauthorized() {
        let (status, _) = body_of(ApiError::AuthError("denied".to_string()).into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upstream_not_found_is_not_found() {
        let err: ProviderError = ApiError::NotFound("no PAM source store".to_string()).into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["diagnostics"][0]["summary"], "Not found");
        assert!(
            body["diagnostics"][0]["detail"]
                .as_str()
                .unwrap()
                .contains("no PAM source store")
        );
    }

    #[test]
    fn test_warning_diagnostic() {
        let diagnostic = Diagnostic::warning("Deprecated", "use auth_method");
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(
            serde_json::to_value(&diagnostic).unwrap()["severity"],
            "warning"
        );
    }
}
