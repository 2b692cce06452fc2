// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::{header, http, Response, StatusCode};
use std::io::{self, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::byte_range::{parse_range, ByteRange, RangeRequest};
use crate::error::GatewayError;
use crate::http_utils::{empty_body, log_and_create_http_response, HttpResponse};

/// Bytes of a content file positioned at the first byte to send and limited to the last one.
#[derive(Debug)]
pub struct FileContent {
    pub reader: Take<File>,
    pub content_type: &'static str,
}

/// Outcome of a content request, mapped one to one onto an HTTP status.
#[derive(Debug)]
pub enum StreamResponse {
    /// 200 with the whole file.
    Full { content: FileContent, length: u64 },
    /// 206 with the bytes of `range`.
    Partial {
        content: FileContent,
        range: ByteRange,
        length: u64,
    },
    /// 404
    NotFound,
    /// 416, no body.
    RangeNotSatisfiable { length: u64 },
}

impl StreamResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            StreamResponse::Full { .. } => StatusCode::OK,
            StreamResponse::Partial { .. } => StatusCode::PARTIAL_CONTENT,
            StreamResponse::NotFound => GatewayError::ResourceNotFound(String::new()).status_code(),
            StreamResponse::RangeNotSatisfiable { .. } => {
                GatewayError::RangeNotSatisfiable.status_code()
            }
        }
    }

    pub fn into_http_response(self, path: &str) -> http::Result<HttpResponse> {
        let status = self.status();
        match self {
            StreamResponse::Full { content, length } => Response::builder()
                .status(status)
                .header(header::CONTENT_LENGTH, length)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_TYPE, content.content_type)
                .body(file_body(content.reader)),
            StreamResponse::Partial {
                content,
                range,
                length,
            } => Response::builder()
                .status(status)
                .header(header::CONTENT_RANGE, range.content_range(length))
                .header(header::CONTENT_LENGTH, range.span_len())
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_TYPE, content.content_type)
                .body(file_body(content.reader)),
            StreamResponse::NotFound => log_and_create_http_response(
                &GatewayError::ResourceNotFound(path.to_string()).to_string(),
                status,
            ),
            StreamResponse::RangeNotSatisfiable { length } => Response::builder()
                .status(status)
                .header(header::CONTENT_RANGE, format!("bytes */{length}"))
                .header(header::ACCEPT_RANGES, "bytes")
                .body(empty_body()),
        }
    }
}

fn file_body(reader: Take<File>) -> crate::http_utils::Body {
    StreamBody::new(ReaderStream::new(reader).map_ok(Frame::data)).boxed_unsync()
}

/// Serves files below a content root, honoring single byte-range requests.
#[derive(Debug, Clone)]
pub struct ContentRangeServer {
    root: PathBuf,
}

impl ContentRangeServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ContentRangeServer { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Looks up `path` under the content root and prepares the response for `range_header`.
    ///
    /// A missing file is `NotFound` whatever the range says. I/O errors past the existence check
    /// (opening or seeking the file) are returned as errors.
    pub async fn serve(
        &self,
        path: &str,
        range_header: Option<&str>,
    ) -> io::Result<StreamResponse> {
        let Some(file_path) = self.resolve(path) else {
            debug!("Rejected content path {path:?}");
            return Ok(StreamResponse::NotFound);
        };
        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) | Err(_) => return Ok(StreamResponse::NotFound),
        };
        let length = metadata.len();
        let content_type = content_type_for(&file_path);

        match parse_range(range_header, length) {
            Ok(RangeRequest::Full) => {
                let file = File::open(&file_path).await?;
                Ok(StreamResponse::Full {
                    content: FileContent {
                        reader: file.take(length),
                        content_type,
                    },
                    length,
                })
            }
            Ok(RangeRequest::Partial(range)) => {
                let mut file = File::open(&file_path).await?;
                file.seek(SeekFrom::Start(range.start)).await?;
                Ok(StreamResponse::Partial {
                    content: FileContent {
                        reader: file.take(range.span_len()),
                        content_type,
                    },
                    range,
                    length,
                })
            }
            Err(err) => {
                debug!("Cannot serve {path:?}: {err}");
                Ok(StreamResponse::RangeNotSatisfiable { length })
            }
        }
    }

    /// Joins `path` onto the root. Absolute paths and any `..` component resolve to `None`.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        let mut has_name = false;
        for component in Path::new(path).components() {
            match component {
                Component::Normal(name) => {
                    resolved.push(name);
                    has_name = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        has_name.then_some(resolved)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("pdf") => "application/pdf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}
