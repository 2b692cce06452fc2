// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

const DEFAULT_HOST: [u8; 4] = [127, 0, 0, 1];
const DEFAULT_PORT: u16 = 8888;
const DEFAULT_LOGGING_URL: &str = "https://localhost:8080/api/v1/logging";
const DEFAULT_CONTENT_ROOT: &str = "modules";
const DEFAULT_SESSION_COOKIE: &str = "unplatform_session";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Base URL of the remote logging service, without a trailing slash
    pub logging_url: String,
    /// Directory that content paths are resolved against
    pub content_root: PathBuf,
    /// Name of the cookie that marks an active terminal session
    pub session_cookie: String,
    /// Timeout for each call to the remote logging service, in milliseconds
    pub remote_timeout_ms: u64,
    /// The bundled logging service runs with a self-signed certificate
    pub accept_invalid_certs: bool,
    pub max_request_content_length: usize,
    pub proxy_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            logging_url: DEFAULT_LOGGING_URL.to_string(),
            content_root: PathBuf::from(DEFAULT_CONTENT_ROOT),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            accept_invalid_certs: false,
            max_request_content_length: 10 * 1024 * 1024, // 10MB in Bytes
            proxy_url: None,
        }
    }
}

impl Config {
    pub fn new() -> Result<Config, Box<dyn std::error::Error>> {
        let defaults = Config::default();

        let host = env::var("UNPLATFORM_HOST")
            .ok()
            .and_then(|host| host.parse::<IpAddr>().ok())
            .unwrap_or(defaults.host);
        let port: u16 = env::var("UNPLATFORM_PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let logging_url = match env::var("UNPLATFORM_LOGGING_URL") {
            Ok(url) => normalize_logging_url(&url)?,
            Err(_) => defaults.logging_url,
        };

        let content_root = env::var("UNPLATFORM_CONTENT_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.content_root);

        let session_cookie = env::var("UNPLATFORM_SESSION_COOKIE")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.session_cookie);

        let remote_timeout_ms = env::var("UNPLATFORM_REMOTE_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(defaults.remote_timeout_ms);

        let accept_invalid_certs = env::var("UNPLATFORM_ACCEPT_INVALID_CERTS")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(defaults.accept_invalid_certs);

        Ok(Config {
            host,
            port,
            logging_url,
            content_root,
            session_cookie,
            remote_timeout_ms,
            accept_invalid_certs,
            max_request_content_length: defaults.max_request_content_length,
            proxy_url: env::var("UNPLATFORM_PROXY_HTTPS")
                .or_else(|_| env::var("HTTPS_PROXY"))
                .ok(),
        })
    }
}

fn normalize_logging_url(url: &str) -> anyhow::Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow::anyhow!(
            "UNPLATFORM_LOGGING_URL must be an http or https URL, got '{url}'"
        ));
    }
    Ok(trimmed.to_string())
}
