// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The capture-source capability (§9): the narrow interface that resolves
//! the cyclic dependency between the Exception Pipeline (reader) and the
//! Debugger Session (owner of the locals cache and dedup set).

use async_trait::async_trait;

use crate::cache::Harvest;

/// How long a reader will wait for an in-flight harvest before giving up
/// and emitting without locals (§4.E step 4).
pub const HARVEST_AWAIT_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(100);

#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Look up (and, if cached, consume) the harvest for `key`. Waits on an
    /// in-flight harvest up to [`HARVEST_AWAIT_TIMEOUT`] if one is pending.
    async fn locals_for_stack_key(&self, key: &str) -> Option<Harvest>;

    /// Has this fingerprint already been emitted via the debugger path?
    async fn was_sent_via_debugger(&self, fingerprint: &str) -> bool;
}
