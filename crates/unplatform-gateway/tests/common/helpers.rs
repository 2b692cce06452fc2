// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

use unplatform_gateway::{
    config::Config, content_server::ContentRangeServer, gateway::Gateway, http_utils::build_client,
    log_gateway::LogEntryGateway, remote_log_client::HttpRemoteLogClient,
    session::CookieSessionVerifier,
};

pub const SESSION_COOKIE: &str = "unplatform_session=terminal-1";

/// Start a gateway on a random local port, talking to the logging service at `logging_url`
pub async fn start_gateway(logging_url: &str, content_root: &Path) -> SocketAddr {
    let config = Config {
        logging_url: logging_url.to_string(),
        content_root: content_root.to_path_buf(),
        ..Default::default()
    };
    let client = build_client(None, Duration::from_secs(2), false).unwrap();
    let remote = Arc::new(HttpRemoteLogClient::with_client(client, logging_url));

    let gateway = Gateway {
        content_server: Arc::new(ContentRangeServer::new(&config.content_root)),
        session_verifier: Arc::new(CookieSessionVerifier::new(config.session_cookie.clone())),
        log_gateway: Arc::new(LogEntryGateway::new(remote)),
        config: Arc::new(config),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = gateway.serve(listener).await;
    });
    addr
}

/// A logging service URL nothing listens on
pub fn unreachable_logging_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/v1/logging")
}

/// Send an HTTP request over TCP and return the response
pub async fn send_tcp_request(
    addr: SocketAddr,
    uri: &str,
    method: &str,
    headers: &[(&str, &str)],
    body: Option<Vec<u8>>,
) -> Result<Response<hyper::body::Incoming>, Box<dyn std::error::Error>> {
    let stream = timeout(Duration::from_secs(2), tokio::net::TcpStream::connect(addr)).await??;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    tokio::spawn(async move {
        let _ = conn.await;
    });

    let mut request_builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Host", addr.to_string());
    for (name, value) in headers {
        request_builder = request_builder.header(*name, *value);
    }

    let request = match body {
        Some(body_data) => {
            let body_len = body_data.len();
            request_builder
                .header("Content-Type", "application/json")
                .header("Content-Length", body_len.to_string())
                .body(Full::new(Bytes::from(body_data)))?
        }
        None => request_builder.body(Full::new(Bytes::new()))?,
    };
    let response = timeout(Duration::from_secs(5), sender.send_request(request)).await??;

    Ok(response)
}

/// Collect a response body
pub async fn read_body(response: Response<hyper::body::Incoming>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}
