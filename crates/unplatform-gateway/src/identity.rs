// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Resolves who is acting on behalf of a logged event.
//!
//! Tools identify their user in whichever field they were written against, so the payload is
//! searched for a fixed list of keys and the first one present wins.

use serde_json::{Map, Value};
use std::fmt;

/// Keys checked for an identity, highest precedence first.
pub const IDENTITY_KEYS: [&str; 4] = ["session_id", "sessionId", "user_id", "userId"];

/// Token used when the payload carries none of [`IDENTITY_KEYS`].
pub const NO_IDENTITY_PROVIDED: &str = "none_provided";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorIdentity(String);

impl ActorIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        ActorIdentity(token.into())
    }

    pub fn none_provided() -> Self {
        ActorIdentity(NO_IDENTITY_PROVIDED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_provided(&self) -> bool {
        self.0 != NO_IDENTITY_PROVIDED
    }
}

impl fmt::Display for ActorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the identity for the first of [`IDENTITY_KEYS`] present in `payload`.
///
/// Strings are taken verbatim and numbers or booleans by their JSON text. A `null`, array or
/// object under a key does not identify anyone, so the search moves on to the next key.
pub fn resolve_identity(payload: &Map<String, Value>) -> ActorIdentity {
    IDENTITY_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(identity_token))
        .map(ActorIdentity)
        .unwrap_or_else(ActorIdentity::none_provided)
}

fn identity_token(value: &Value) -> Option<String> {
    match value {
        Value::String(token) => Some(token.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
