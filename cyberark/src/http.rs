// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Thin wrapper over [`reqwest`] shared by every CyberArk API client.
//!
//! The wrapper owns three concerns:
//!
//! 1. **Request construction**: JSON bodies are serialized here so they can be
//!    logged (when debug logging is on) before they leave the process.
//! 2. **Authentication**: a [`Session`] stamps the `Authorization` header from
//!    its [`AccessToken`] on every request.
//! 3. **Response buffering**: the whole body is read into an [`ApiResponse`]
//!    so status handling and decoding never race the connection.
//!
//! # Debug logging
//!
//! Every request is logged at `debug` with method, URL and status. With the
//! debug flag set, bodies are logged too, unless the request is flagged
//! sensitive (logins, account secrets) in which case [`REDACTED`] is logged.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::AccessToken;
use crate::constants::{REDACTED, USER_AGENT};
use crate::errors::ApiError;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    debug: bool,
}

impl HttpClient {
    pub fn new(timeout: Duration, debug: bool) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("unable to build http client: {e}")))?;

        Ok(Self { client, debug })
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Executes `request`, optionally with a JSON `body`, and buffers the response.
    ///
    /// Non-2xx statuses are *not* errors at this layer; callers decide via
    /// [`ApiResponse::error_for_status`] because some statuses (404, 409) are
    /// expected outcomes for certain operations.
    pub async fn send<B>(
        &self,
        request: RequestBuilder,
        body: Option<&B>,
        sensitive: bool,
    ) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = match body {
            Some(body) => {
                let payload = serde_json::to_vec(body)?;
                if self.debug {
                    tracing::debug!(
                        "[cyberark] request body: {}",
                        printable(&payload, sensitive)
                    );
                }
                request
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .body(payload)
            }
            None => request,
        };

        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!("[cyberark] {} {}", method, redact_query(&url));

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(
            "[cyberark] {} {} -> {} ({} bytes)",
            method,
            redact_query(&url),
            status.as_u16(),
            body.len()
        );
        if self.debug {
            tracing::debug!("[cyberark] response body: {}", printable(&body, sensitive));
        }

        Ok(ApiResponse {
            status,
            url: redact_query(&url),
            body,
        })
    }
}

/// Authenticated request context shared by the API clients.
#[derive(Debug)]
pub struct Session {
    http: HttpClient,
    token: AccessToken,
}

impl Session {
    pub fn new(http: HttpClient, token: AccessToken) -> Self {
        Self { http, token }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        self.request_accepting(method, url, "application/json")
    }

    /// Like [`Session::request`] with a custom `Accept` media type.
    pub fn request_accepting(
        &self,
        method: Method,
        url: Url,
        accept: &'static str,
    ) -> Result<RequestBuilder, ApiError> {
        let authorization = self.token.header_value()?;
        Ok(self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static(accept))
            .header(AUTHORIZATION, authorization))
    }

    pub async fn send<B>(
        &self,
        request: RequestBuilder,
        body: Option<&B>,
        sensitive: bool,
    ) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.http.send(request, body, sensitive).await
    }

    /// Sends a request without a body.
    pub async fn execute(&self, request: RequestBuilder) -> Result<ApiResponse, ApiError> {
        self.http.send::<()>(request, None, false).await
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub fn is_conflict(&self) -> bool {
        self.status == StatusCode::CONFLICT
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::error!("[cyberark] unable to decode response from {}: {}", self.url, e);
            ApiError::DecodeError(format!("{}: {}", self.url, e))
        })
    }

    /// Maps non-2xx statuses to [`ApiError`].
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            return Ok(self);
        }

        tracing::warn!(
            "[cyberark] {} returned status {}",
            self.url,
            self.status.as_u16()
        );

        let err = match self.status {
            StatusCode::NOT_FOUND => ApiError::NotFound(self.url.clone()),
            StatusCode::CONFLICT => ApiError::Conflict(self.text()),
            status => ApiError::StatusError {
                status: status.as_u16(),
                url: self.url.clone(),
                body: self.text(),
            },
        };
        Err(err)
    }
}

/// Appends `segments` to `base`, percent-encoding each one.
///
/// An empty trailing segment produces a trailing slash, which several PVWA
/// endpoints expect.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::ConfigError(format!("{base} cannot be a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn printable(body: &[u8], sensitive: bool) -> String {
    if sensitive {
        REDACTED.to_string()
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

fn redact_query(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
