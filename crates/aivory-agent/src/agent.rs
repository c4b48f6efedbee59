// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The public SDK surface (§6 Public API): a process-wide singleton with an
//! idempotent `init`/`shutdown` lifecycle, matching the source system's
//! "global mutable init state" (§9 Design Notes) the way a Rust embed
//! naturally can — one `OnceLock`-backed slot instead of a module-level
//! global.

use std::sync::{Arc, OnceLock};

use aivory_core::{AivoryError, ContextStore, ExceptionCapture, InitOptions, UserInfo};
use aivory_debugger::InspectorLink;
use aivory_pipeline::{ExceptionHookSource, RawException};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::lifecycle::Lifecycle;

fn slot() -> &'static RwLock<Option<Arc<Lifecycle>>> {
    static SLOT: OnceLock<RwLock<Option<Arc<Lifecycle>>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(None))
}

/// Initialize the agent: resolve configuration, connect to the collector,
/// enable the debugger, and install the exception hooks.
///
/// Idempotent — a second call while already initialized logs and returns
/// `Ok(())` without disturbing the running agent (§6, §9 "the second `init`
/// is a no-op").
///
/// `inspector` and `hooks` are the host-specific boundaries the embedding
/// application supplies: `InspectorLink` drives the concrete debugger
/// protocol, `ExceptionHookSource` drives the concrete
/// `uncaughtException`/`unhandledRejection` registration. Neither has a
/// single canonical Rust-native implementation the way they would for a
/// fixed host runtime, so `init` takes them explicitly instead of
/// constructing them itself.
pub async fn init(
    options: InitOptions,
    inspector: Arc<dyn InspectorLink>,
    hooks: Arc<dyn ExceptionHookSource>,
) -> Result<(), AivoryError> {
    let mut guard = slot().write().await;
    if guard.is_some() {
        tracing::info!("aivory_agent::init called while already initialized, ignoring");
        return Ok(());
    }
    let lifecycle = Lifecycle::start(options, inspector, hooks).await?;
    *guard = Some(lifecycle);
    Ok(())
}

/// Whether `init` has run and `shutdown` has not yet torn it down.
pub async fn is_initialized() -> bool {
    slot().read().await.is_some()
}

/// Tear down the running agent in the mandated order (§5). A no-op if the
/// agent was never initialized or has already been shut down.
pub async fn shutdown() {
    let lifecycle = slot().write().await.take();
    if let Some(lifecycle) = lifecycle {
        lifecycle.teardown().await;
    } else {
        tracing::debug!("aivory_agent::shutdown called without a running agent, ignoring");
    }
}

/// Manually report an exception (§4.E `capture` entry point). Returns
/// `None` if the agent isn't initialized or the sampling predicate dropped
/// the event.
pub async fn capture_exception(
    error: &RawException,
    context: Option<Map<String, Value>>,
) -> Option<ExceptionCapture> {
    let lifecycle = slot().read().await.clone();
    match lifecycle {
        Some(lifecycle) => lifecycle.pipeline.capture(error, context).await,
        None => {
            tracing::warn!("capture_exception called before init, dropping");
            None
        }
    }
}

/// Merge `fields` into the process-wide custom context attached to every
/// future capture (§6 `set_context`).
pub async fn set_context(fields: Map<String, Value>) {
    match context_store().await {
        Some(context) => context.set_context(fields).await,
        None => tracing::warn!("set_context called before init, ignoring"),
    }
}

/// Replace the process-wide user identity attached to every future capture
/// (§6 `set_user`).
pub async fn set_user(user: UserInfo) {
    match context_store().await {
        Some(context) => context.set_user(user).await,
        None => tracing::warn!("set_user called before init, ignoring"),
    }
}

async fn context_store() -> Option<Arc<ContextStore>> {
    slot().read().await.as_ref().map(|lifecycle| Arc::clone(&lifecycle.context))
}

#[cfg(test)]
#[path = "agent_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
