// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parsing of single byte-range request headers.
//!
//! Accepted forms are `bytes=<start>-`, `bytes=<start>-<end>` and the suffix form `bytes=-<len>`.
//! The end is always clamped to the last byte of the resource, since a client asking for a range
//! does not have to know how long the resource is.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte, inclusive.
    pub start: u64,
    /// Last byte, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered. Never zero.
    pub fn span_len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this span of a resource of `resource_length` bytes.
    pub fn content_range(&self, resource_length: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, resource_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No range was asked for: send the whole resource with a 200.
    Full,
    Partial(ByteRange),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range starts beyond a resource of {resource_length} bytes")]
    Unsatisfiable { resource_length: u64 },
    #[error("malformed range header '{0}'")]
    Malformed(String),
}

pub fn parse_range(header: Option<&str>, resource_length: u64) -> Result<RangeRequest, RangeError> {
    let Some(header) = header else {
        return Ok(RangeRequest::Full);
    };
    let malformed = || RangeError::Malformed(header.to_string());
    let unsatisfiable = RangeError::Unsatisfiable { resource_length };

    let value = header.trim();
    let (unit, span) = value.split_once('=').ok_or_else(malformed)?;
    if !unit.trim().eq_ignore_ascii_case("bytes") || span.contains(',') {
        return Err(malformed());
    }
    let (first, last) = span.trim().split_once('-').ok_or_else(malformed)?;
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // suffix form: the final `last` bytes
        let suffix = parse_offset(last).ok_or_else(malformed)?;
        if suffix == 0 || resource_length == 0 {
            return Err(unsatisfiable);
        }
        return Ok(RangeRequest::Partial(ByteRange {
            start: resource_length.saturating_sub(suffix),
            end: resource_length - 1,
        }));
    }

    let start = parse_offset(first).ok_or_else(malformed)?;
    let requested_end = if last.is_empty() {
        None
    } else {
        Some(parse_offset(last).ok_or_else(malformed)?)
    };

    if start >= resource_length {
        return Err(unsatisfiable);
    }
    if requested_end.is_some_and(|end| start > end) {
        return Err(unsatisfiable);
    }
    let end = requested_end.map_or(resource_length - 1, |end| end.min(resource_length - 1));
    Ok(RangeRequest::Partial(ByteRange { start, end }))
}

fn parse_offset(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
