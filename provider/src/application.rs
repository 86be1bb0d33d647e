// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::configuration::ServeOptions;
use crate::constants::{HANDSHAKE_PREFIX, MAX_REQUEST_BODY_SIZE, PROTOCOL_VERSION};
use crate::provider::Provider;
use crate::routes;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::serve::Serve;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub options: ServeOptions,
    pub provider: Arc<Provider>,
}

pub struct Application {
    host: String,
    port: u16,
    provider: Arc<Provider>,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(options: ServeOptions, provider: Arc<Provider>) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let host = options.host.clone();
        let server = run(listener, options, provider.clone())?;
        let port = server.local_addr()?.port();

        tracing::info!("[provider] listening at http://{}:{}", host, port);

        Ok(Self {
            host,
            port,
            provider,
            server,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The line the engine reads from stdout to find the plugin.
    pub fn handshake(&self) -> String {
        format!(
            "{}|{}|{}:{}",
            HANDSHAKE_PREFIX, PROTOCOL_VERSION, self.host, self.port
        )
    }

    /// Serves until Ctrl-C, then ends the CyberArk session.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.with_graceful_shutdown(shutdown_signal()).await?;
        tracing::info!("[provider] shutting down");
        self.provider.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[provider] unable to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
}

/// Builds the router with the production middleware (body limit, timeout,
/// request tracing).
pub fn create_router(options: ServeOptions, provider: Arc<Provider>) -> Router {
    let timeout = options.request_timeout();
    let state = Arc::new(AppState { options, provider });

    Router::new()
        .route("/health", get(routes::health))
        .route("/schema", get(routes::schema))
        .route("/configure", post(routes::configure))
        .route("/resources/{type_name}/plan", post(routes::plan_resource))
        .route("/resources/{type_name}/create", post(routes::create_resource))
        .route("/resources/{type_name}/read", post(routes::read_resource))
        .route("/resources/{type_name}/update", post(routes::update_resource))
        .route("/resources/{type_name}/delete", post(routes::delete_resource))
        .route("/resources/{type_name}/import", post(routes::import_resource))
        .route("/data-sources/{type_name}/read", post(routes::read_data_source))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_SIZE))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(skip(listener, provider))]
pub fn run(
    listener: TcpListener,
    options: ServeOptions,
    provider: Arc<Provider>,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    let app = create_router(options, provider);
    Ok(axum::serve(listener, app))
}
