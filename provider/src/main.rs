// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use anyhow::Context;
use clap::Parser;
use cyberark_provider::application::Application;
use cyberark_provider::configuration::ServeOptions;
use cyberark_provider::provider::Provider;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        // stdout is reserved for the handshake line
        .with_writer(std::io::stderr)
        .init();

    // get options from arguments or environment variables
    let options = ServeOptions::parse();

    tracing::info!("[provider] {:?}", &options);

    let provider = Arc::new(Provider::new());

    let application = Application::build(options, provider)
        .await
        .context("unable to bind the plugin listener")?;

    println!("{}", application.handshake());

    application
        .run_until_stopped()
        .await
        .context("plugin server failed")
}
