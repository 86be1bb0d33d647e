// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("request to {0} failed: {1}")]
    RequestError(String, String),
    #[error("unexpected status {status} from {url}: {body}")]
    StatusError {
        status: u16,
        url: String,
        body: String,
    },
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unable to decode response: {0}")]
    DecodeError(String),
    #[error("authentication failed: {0}")]
    AuthError(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// HTTP status reported by CyberArk, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::StatusError { status, .. } => Some(*status),
            Self::Conflict(_) => Some(409),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(source: reqwest::Error) -> Self {
        tracing::error!("[cyberark] {:?}", source);
        let url = source
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        // never echo the full error chain, it may include request details
        let reason = if source.is_timeout() {
            "timed out".to_string()
        } else if source.is_connect() {
            "connection failed".to_string()
        } else if source.is_decode() {
            "invalid response body".to_string()
        } else {
            "transport error".to_string()
        };
        ApiError::RequestError(url, reason)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(source: serde_json::Error) -> Self {
        ApiError::DecodeError(source.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(source: url::ParseError) -> Self {
        ApiError::ConfigError(format!("invalid url: {source}"))
    }
}
