// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The mutable, process-wide capture context (§6 `set_context`/`set_user`):
//! the custom key/value map and optional user identity merged into every
//! outbound `ExceptionCapture`. Unlike [`crate::Config`], which is resolved
//! once and shared read-only, this is the one piece of agent state that
//! changes for the life of the process.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// The optional user identity attached to every capture (§6 `set_user`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UserInfo {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.is_none() && self.username.is_none()
    }
}

/// Process-wide custom context and user identity, read on every capture.
#[derive(Debug, Default)]
pub struct ContextStore {
    custom: Mutex<Map<String, Value>>,
    user: Mutex<Option<UserInfo>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `fields` into the stored custom context, overwriting any
    /// existing keys with the same name.
    pub async fn set_context(&self, fields: Map<String, Value>) {
        self.custom.lock().await.extend(fields);
    }

    /// Replace the stored user identity.
    pub async fn set_user(&self, user: UserInfo) {
        *self.user.lock().await = Some(user);
    }

    /// Build the merged `context` value for one capture: the stored custom
    /// context, overlaid with `extra` (the per-call argument to
    /// `capture_exception(error, context)`), plus a `user` key if a user
    /// identity has been set.
    pub async fn snapshot(&self, extra: Option<&Map<String, Value>>) -> Value {
        let mut merged = self.custom.lock().await.clone();
        if let Some(extra) = extra {
            merged.extend(extra.clone());
        }
        if let Some(user) = self.user.lock().await.clone() {
            if !user.is_empty() {
                merged.insert("user".to_owned(), serde_json::to_value(user).unwrap_or(Value::Null));
            }
        }
        Value::Object(merged)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
