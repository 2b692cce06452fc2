// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use cookie::Cookie;
use hyper::header::{HeaderMap, COOKIE};

/// Decides whether a request belongs to an active terminal session.
///
/// Issuing sessions (login, cookie management) is owned by the surrounding application; the
/// gateway only asks this question before touching the logging service.
pub trait SessionVerifier {
    fn has_active_session(&self, headers: &HeaderMap) -> bool;
}

/// Treats a request as logged in when it carries a non-empty session cookie.
#[derive(Debug, Clone)]
pub struct CookieSessionVerifier {
    cookie_name: String,
}

impl CookieSessionVerifier {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        CookieSessionVerifier {
            cookie_name: cookie_name.into(),
        }
    }
}

impl SessionVerifier for CookieSessionVerifier {
    fn has_active_session(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value).filter_map(Result::ok))
            .any(|cookie| cookie.name() == self.cookie_name && !cookie.value().is_empty())
    }
}
