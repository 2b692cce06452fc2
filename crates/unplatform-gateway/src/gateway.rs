// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body as HttpBody;
use hyper::service::service_fn;
use hyper::{http, HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Map, Value};
use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::content_server::ContentRangeServer;
use crate::error::GatewayError;
use crate::http_utils::{
    create_json_response, log_and_create_http_response, verify_request_content_length,
    HttpResponse,
};
use crate::log_gateway::{CreateEntryOutcome, LogEntryGateway};
use crate::session::SessionVerifier;

const APPDATA_ENDPOINT_PATH: &str = "/api/appdata";
const CONTENT_ENDPOINT_PREFIX: &str = "/content/";
const VERSION_ENDPOINT_PATH: &str = "/version";
/// Header some content players send instead of `Range`.
const LEGACY_RANGE_HEADER: &str = "byte-range";

/// HTTP front of the terminal: log entry reads and writes plus content streaming.
#[derive(Clone)]
pub struct Gateway {
    pub config: Arc<Config>,
    pub log_gateway: Arc<LogEntryGateway>,
    pub content_server: Arc<ContentRangeServer>,
    pub session_verifier: Arc<dyn SessionVerifier + Send + Sync>,
}

impl Gateway {
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = SocketAddr::new(self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serves requests accepted on `listener` until accepting fails for good.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let now = Instant::now();
        let gateway = Arc::new(self.clone());

        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
            // called for each http request
            let gateway = Arc::clone(&gateway);
            async move { gateway.endpoint_handler(req).await }
        });

        info!(
            "Gateway listening on {}, serving content from {}",
            listener.local_addr()?,
            self.content_server.root().display()
        );
        debug!(
            "Time taken to start the gateway: {} ms",
            now.elapsed().as_millis()
        );

        Self::serve_tcp(listener, service).await
    }

    async fn serve_tcp<S>(
        listener: TcpListener,
        service: S,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        S: hyper::service::Service<
                hyper::Request<hyper::body::Incoming>,
                Response = HttpResponse,
            > + Clone
            + Send
            + 'static,
        S::Future: Send,
        S::Error: std::error::Error + Send + Sync + 'static,
    {
        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    pub async fn endpoint_handler<B>(&self, req: Request<B>) -> http::Result<HttpResponse>
    where
        B: HttpBody,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let path = req.uri().path().to_string();
        match (req.method(), path.as_str()) {
            (&Method::GET, APPDATA_ENDPOINT_PATH) => self.list_entries_handler(req.headers()).await,
            (&Method::POST, APPDATA_ENDPOINT_PATH) => self.create_entry_handler(req).await,
            (&Method::GET, VERSION_ENDPOINT_PATH) => self.version_handler(),
            (&Method::GET, content_path) if content_path.starts_with(CONTENT_ENDPOINT_PREFIX) => {
                let relative = &content_path[CONTENT_ENDPOINT_PREFIX.len()..];
                self.content_handler(relative, req.headers()).await
            }
            _ => log_and_create_http_response(
                &format!("No route for {} {path}", req.method()),
                StatusCode::NOT_FOUND,
            ),
        }
    }

    async fn list_entries_handler(&self, headers: &HeaderMap) -> http::Result<HttpResponse> {
        let session_active = self.session_verifier.has_active_session(headers);
        match self.log_gateway.list_entries(session_active).await {
            Ok(entries) => create_json_response(&entries, StatusCode::OK),
            Err(err) => log_and_create_http_response(&err.to_string(), err.status_code()),
        }
    }

    async fn create_entry_handler<B>(&self, req: Request<B>) -> http::Result<HttpResponse>
    where
        B: HttpBody,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        if !self.session_verifier.has_active_session(&parts.headers) {
            let err = GatewayError::Unauthorized;
            return log_and_create_http_response(&err.to_string(), err.status_code());
        }
        if let Some(response) = verify_request_content_length(
            &parts.headers,
            self.config.max_request_content_length,
            "Error processing log entry",
        ) {
            return response;
        }

        // chunked bodies carry no length up front, so the cap is enforced while reading
        let limited = Limited::new(body, self.config.max_request_content_length);
        let body_bytes = match limited.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return log_and_create_http_response(
                    "Error processing log entry: Payload too large",
                    StatusCode::PAYLOAD_TOO_LARGE,
                );
            }
            Err(e) => {
                return log_and_create_http_response(
                    &format!("Error reading log entry body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        let payload = match parse_payload(&body_bytes) {
            Ok(payload) => payload,
            Err(message) => {
                return log_and_create_http_response(
                    &format!("Error processing log entry: {message}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        match self.log_gateway.create_entry(true, payload).await {
            Ok(CreateEntryOutcome::Created(entry)) => create_json_response(&entry, StatusCode::OK),
            Ok(CreateEntryOutcome::Degraded(report)) => {
                create_json_response(&report, StatusCode::OK)
            }
            Err(err) => log_and_create_http_response(&err.to_string(), err.status_code()),
        }
    }

    async fn content_handler(
        &self,
        raw_path: &str,
        headers: &HeaderMap,
    ) -> http::Result<HttpResponse> {
        let Some(path) = percent_decode(raw_path) else {
            let err = GatewayError::ResourceNotFound(raw_path.to_string());
            return log_and_create_http_response(&err.to_string(), err.status_code());
        };
        let range_header = headers
            .get(hyper::header::RANGE)
            .or_else(|| headers.get(LEGACY_RANGE_HEADER))
            // a range that is not even text is malformed, never ignored
            .map(|value| value.to_str().unwrap_or_default());

        match self.content_server.serve(&path, range_header).await {
            Ok(response) => {
                debug!(path = %path, status = %response.status(), "Serving content");
                response.into_http_response(&path)
            }
            Err(err) => log_and_create_http_response(
                &format!("Error reading content {path}: {err}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }

    fn version_handler(&self) -> http::Result<HttpResponse> {
        let response_json = json!(
            {
                "version": env!("CARGO_PKG_VERSION"),
                "endpoints": [
                    APPDATA_ENDPOINT_PATH,
                    CONTENT_ENDPOINT_PREFIX,
                    VERSION_ENDPOINT_PATH
                ],
                "config": {
                    "logging_url": self.config.logging_url,
                    "content_root": self.config.content_root.display().to_string(),
                    "session_cookie": self.config.session_cookie,
                    "remote_timeout_ms": self.config.remote_timeout_ms
                }
            }
        );
        create_json_response(&response_json, StatusCode::OK)
    }
}

/// An empty (or blank) body is an empty payload; anything else must be a JSON object.
fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(payload)) => Ok(payload),
        Ok(_) => Err("payload must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Decodes `%XX` escapes of a request path. `None` for broken escapes or non UTF-8 results.
fn percent_decode(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}
