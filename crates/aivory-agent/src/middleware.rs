// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Error-middleware helper (§6, §9 Supplemented features): a plain data
//! constructor a host web framework's error middleware can attach via
//! `set_context`/`capture_exception`. Framework-specific glue (Axum, Actix,
//! ...) is out of scope — this stops at producing the map.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// The request-shaped facts worth attaching to a capture taken from inside
/// an HTTP error handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), ..Default::default() }
    }

    /// Render as a `request` field suitable for `set_context`/the per-call
    /// `context` argument to `capture_exception`.
    pub fn to_context_map(&self) -> Map<String, Value> {
        let mut request = Map::new();
        request.insert("method".to_owned(), Value::String(self.method.clone()));
        request.insert("url".to_owned(), Value::String(self.url.clone()));
        request.insert(
            "headers".to_owned(),
            Value::Object(self.headers.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()),
        );
        request.insert(
            "query".to_owned(),
            Value::Object(self.query.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()),
        );
        if let Some(body) = &self.body {
            request.insert("body".to_owned(), body.clone());
        }

        let mut map = Map::new();
        map.insert("request".to_owned(), Value::Object(request));
        map
    }
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
