// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use core::time::Duration;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::http_utils::build_client;
use crate::identity::ActorIdentity;
use crate::model::{Log, LogEntry, NewLog, NewLogEntry};

/// Header carrying the acting identity on entry writes. The logging service derives the entry's
/// owner from it rather than from the body.
pub const IDENTITY_HEADER: &str = "x-api-proxy";

const LOGS_PATH: &str = "/logs";

#[derive(Debug, Error)]
pub enum RemoteLogError {
    /// Connection refused, DNS, TLS or timeout talking to the logging service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The logging service answered with a non-success status.
    #[error("logging service returned status {0}")]
    Status(u16),
    /// The response body was not the JSON shape we expected.
    #[error("failed to decode logging service response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("unable to build logging client: {0}")]
    Client(String),
}

impl RemoteLogError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteLogError::Transport(e) if e.is_timeout())
    }
}

/// Calls the gateway makes against the remote logging service.
#[async_trait]
pub trait RemoteLogClient {
    async fn list_logs(&self) -> Result<Vec<Log>, RemoteLogError>;

    async fn create_log(&self, log: &NewLog) -> Result<Log, RemoteLogError>;

    async fn list_entries(&self, log_id: &str) -> Result<Vec<LogEntry>, RemoteLogError>;

    /// Sends `entry` to the given log. `identity` travels in [`IDENTITY_HEADER`], never in the
    /// body.
    async fn create_entry(
        &self,
        log_id: &str,
        entry: &NewLogEntry,
        identity: &ActorIdentity,
    ) -> Result<LogEntry, RemoteLogError>;
}

/// [`RemoteLogClient`] speaking JSON over HTTP to the logging service.
#[derive(Debug, Clone)]
pub struct HttpRemoteLogClient {
    client: Client,
    base_url: String,
}

impl HttpRemoteLogClient {
    pub fn new(config: &Config) -> Result<Self, RemoteLogError> {
        let client = build_client(
            config.proxy_url.as_deref(),
            Duration::from_millis(config.remote_timeout_ms),
            config.accept_invalid_certs,
        )
        .map_err(|e| RemoteLogError::Client(e.to_string()))?;
        Ok(Self::with_client(client, config.logging_url.clone()))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        HttpRemoteLogClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn entries_path(log_id: &str) -> String {
        // Log ids arrive already percent-encoded from the service and are used as-is.
        format!("{LOGS_PATH}/{log_id}/entries")
    }

    /// Attaches headers, sends the request, classifies the status and decodes the JSON body.
    async fn send_request<B, T>(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&B>,
    ) -> Result<T, RemoteLogError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "logging service request");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json")
            .headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        debug!(
            method = %method,
            url = %url,
            status = %status,
            body_len = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "logging service response"
        );

        classify_status(status)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn classify_status(status: StatusCode) -> Result<(), RemoteLogError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(RemoteLogError::Status(status.as_u16()))
    }
}

#[async_trait]
impl RemoteLogClient for HttpRemoteLogClient {
    async fn list_logs(&self) -> Result<Vec<Log>, RemoteLogError> {
        self.send_request::<(), _>(Method::GET, LOGS_PATH, HeaderMap::new(), None)
            .await
    }

    async fn create_log(&self, log: &NewLog) -> Result<Log, RemoteLogError> {
        self.send_request(Method::POST, LOGS_PATH, HeaderMap::new(), Some(log))
            .await
    }

    async fn list_entries(&self, log_id: &str) -> Result<Vec<LogEntry>, RemoteLogError> {
        self.send_request::<(), _>(
            Method::GET,
            &Self::entries_path(log_id),
            HeaderMap::new(),
            None,
        )
        .await
    }

    async fn create_entry(
        &self,
        log_id: &str,
        entry: &NewLogEntry,
        identity: &ActorIdentity,
    ) -> Result<LogEntry, RemoteLogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            IDENTITY_HEADER,
            HeaderValue::from_str(identity.as_str())
                .map_err(|_| RemoteLogError::InvalidHeader(IDENTITY_HEADER.to_string()))?,
        );
        self.send_request(
            Method::POST,
            &Self::entries_path(log_id),
            headers,
            Some(entry),
        )
        .await
    }
}
