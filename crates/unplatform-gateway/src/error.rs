// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use hyper::StatusCode;

/// Failures a gateway operation can report to its caller.
///
/// Remote logging failures never leave the gateway as `RemoteUnavailable`: they are degraded
/// into successful responses. The variant exists so callers further out can classify them.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No active session")]
    Unauthorized,

    #[error("Remote logging service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::FORBIDDEN,
            GatewayError::RemoteUnavailable(_) => StatusCode::OK,
            GatewayError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}
