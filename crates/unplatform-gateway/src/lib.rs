// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Gateway between learning terminals, the remote logging service and local course content.
//!
//! Log entry reads and writes are forwarded to the default log of the logging service and never
//! fail because the service is down. Content files are streamed with single byte-range support.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod byte_range;
pub mod config;
pub mod content_server;
pub mod error;
pub mod gateway;
pub mod http_utils;
pub mod identity;
pub mod log_gateway;
pub mod log_resolver;
pub mod model;
pub mod remote_log_client;
pub mod session;
