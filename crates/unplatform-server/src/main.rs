// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use unplatform_gateway::{
    config, content_server::ContentRangeServer, gateway::Gateway, log_gateway::LogEntryGateway,
    remote_log_client::HttpRemoteLogClient, session::CookieSessionVerifier,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("UNPLATFORM_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match config::Config::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on unplatform gateway startup: {e}");
            return;
        }
    };

    let remote_client = match HttpRemoteLogClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Error creating logging service client: {e}");
            return;
        }
    };
    info!("Forwarding log entries to {}", remote_client.base_url());

    let gateway = Gateway {
        config: Arc::clone(&config),
        log_gateway: Arc::new(LogEntryGateway::new(remote_client)),
        content_server: Arc::new(ContentRangeServer::new(config.content_root.clone())),
        session_verifier: Arc::new(CookieSessionVerifier::new(config.session_cookie.clone())),
    };

    if let Err(e) = gateway.start().await {
        error!("Error when running unplatform gateway: {e:?}");
    }
}
