// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The Exception Pipeline (§4.E): installs the host's two exception hooks,
//! parses and fingerprints whatever they report, reunites it with any
//! harvest the Debugger Session already took, and hands the result to
//! Transport.

use std::sync::Arc;
use std::time::Duration;

use aivory_core::{Config, ContextStore};
use aivory_debugger::{CaptureSource, DetectedException};
use aivory_transport::TransportHandle;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::fingerprint::content_fingerprint;
use crate::grammar::parse_stack_trace;
use crate::hook::{ExceptionHandler, ExceptionHookSource, HookKind, RawException};

/// How long to let Transport flush before exiting an uncaught exception
/// with no pre-existing handler (§4.E step 7).
const EXIT_DELAY: Duration = Duration::from_millis(500);

fn now_ms() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

struct InstalledHooks {
    uncaught_prior: Option<ExceptionHandler>,
    rejection_prior: Option<ExceptionHandler>,
}

pub struct ExceptionPipeline {
    config: Arc<Config>,
    hooks: Arc<dyn ExceptionHookSource>,
    capture_source: Arc<dyn CaptureSource>,
    context: Arc<ContextStore>,
    transport: TransportHandle,
    installed: Mutex<Option<InstalledHooks>>,
}

impl ExceptionPipeline {
    pub fn new(
        config: Arc<Config>,
        hooks: Arc<dyn ExceptionHookSource>,
        capture_source: Arc<dyn CaptureSource>,
        context: Arc<ContextStore>,
        transport: TransportHandle,
    ) -> Arc<Self> {
        Arc::new(Self { config, hooks, capture_source, context, transport, installed: Mutex::new(None) })
    }

    /// Install both host hooks, remembering whatever was already registered
    /// so it can be chained to on trigger. Takes an owned `Arc` (callers pass
    /// a clone) since each installed closure needs its own handle back to
    /// this pipeline.
    pub async fn install(self: Arc<Self>) {
        let uncaught_prior = self
            .hooks
            .install(HookKind::UncaughtException, Self::handler_for(&self, HookKind::UncaughtException))
            .await;
        let rejection_prior = self
            .hooks
            .install(HookKind::UnhandledRejection, Self::handler_for(&self, HookKind::UnhandledRejection))
            .await;
        *self.installed.lock().await = Some(InstalledHooks { uncaught_prior, rejection_prior });
    }

    fn handler_for(this: &Arc<Self>, kind: HookKind) -> ExceptionHandler {
        let this = Arc::clone(this);
        Arc::new(move |raw| {
            let this = Arc::clone(&this);
            tokio::spawn(async move { this.on_hook_fired(kind, raw).await });
        })
    }

    /// Restore whatever handlers were installed before this pipeline (§5
    /// Teardown: hooks are uninstalled first, ahead of breakpoints and the
    /// debugger and transport, so no in-flight exception can race shutdown).
    pub async fn uninstall(&self) {
        if let Some(state) = self.installed.lock().await.take() {
            self.hooks.uninstall(HookKind::UncaughtException, state.uncaught_prior).await;
            self.hooks.uninstall(HookKind::UnhandledRejection, state.rejection_prior).await;
        }
    }

    /// The manual-report entry point (§4.E): sampling, parse, stack key,
    /// harvest-await, assemble, and hand off to Transport. No dedup check
    /// and no hook chaining — a deliberate `capture_exception` call is never
    /// a duplicate of a debugger-originated auto-capture.
    pub async fn capture(
        &self,
        raw: &RawException,
        extra_context: Option<Map<String, Value>>,
    ) -> Option<aivory_core::ExceptionCapture> {
        if !self.config.sample() {
            return None;
        }
        let capture = self.assemble(raw, extra_context).await;
        self.emit(&capture);
        Some(capture)
    }

    /// The debugger-originated path (§8 property 7): the debugger saw the
    /// pause and already harvested locals off the live call stack, so there
    /// is no grammar to re-parse and no await-the-harvest step — just
    /// fingerprint, attach context, and emit.
    pub async fn report_from_debugger(&self, detected: DetectedException) {
        if !self.config.sample() {
            return;
        }
        let fingerprint = content_fingerprint(&detected.exception_type, &detected.stack_trace);
        let context = self.context.snapshot(None).await;
        let capture = aivory_core::ExceptionCapture {
            id: Uuid::new_v4().to_string(),
            exception_type: detected.exception_type,
            message: detected.message,
            fingerprint,
            stack_trace: detected.stack_trace,
            local_variables: detected.locals,
            context,
            captured_at: now_ms(),
        };
        self.emit(&capture);
    }

    /// The full hook-triggered path (§4.E steps 1-7).
    async fn on_hook_fired(self: Arc<Self>, kind: HookKind, raw: RawException) {
        if self.config.sample() {
            let extra_context = (kind == HookKind::UnhandledRejection)
                .then(|| serde_json::json!({"type": "unhandledRejection"}).as_object().cloned())
                .flatten();
            let capture = self.assemble(&raw, extra_context).await;
            let top_lines: Vec<u32> = capture.stack_trace.iter().take(3).map(|f| f.line_number).collect();
            let dedup_key = aivory_core::keys::dedup_fingerprint(&raw.exception_type, &top_lines);

            if self.capture_source.was_sent_via_debugger(&dedup_key).await {
                tracing::debug!(dedup_key, "suppressing duplicate, already emitted via the debugger path");
            } else {
                self.emit(&capture);
            }
        }
        self.chain_or_exit(kind, raw).await;
    }

    async fn assemble(
        &self,
        raw: &RawException,
        extra_context: Option<Map<String, Value>>,
    ) -> aivory_core::ExceptionCapture {
        let stack_trace = parse_stack_trace(&raw.stack_text);
        let key = aivory_core::keys::stack_key(&raw.stack_text, now_ms());

        let local_variables =
            self.capture_source.locals_for_stack_key(&key).await.map(|h| h.locals).unwrap_or_default();

        let fingerprint = content_fingerprint(&raw.exception_type, &stack_trace);
        let context = self.context.snapshot(extra_context.as_ref()).await;

        aivory_core::ExceptionCapture {
            id: Uuid::new_v4().to_string(),
            exception_type: raw.exception_type.clone(),
            message: raw.message.clone(),
            fingerprint,
            stack_trace,
            local_variables,
            context,
            captured_at: now_ms(),
        }
    }

    fn emit(&self, capture: &aivory_core::ExceptionCapture) {
        self.transport.send("exception", exception_payload(&self.config, capture));
    }

    async fn chain_or_exit(&self, kind: HookKind, raw: RawException) {
        let prior = {
            let guard = self.installed.lock().await;
            guard.as_ref().and_then(|state| match kind {
                HookKind::UncaughtException => state.uncaught_prior.clone(),
                HookKind::UnhandledRejection => state.rejection_prior.clone(),
            })
        };

        match prior {
            Some(handler) => handler(raw),
            None if kind == HookKind::UncaughtException => {
                tracing::error!("uncaught exception with no prior handler, scheduling process exit");
                let hooks = Arc::clone(&self.hooks);
                tokio::spawn(async move {
                    tokio::time::sleep(EXIT_DELAY).await;
                    hooks.exit_process(1);
                });
            }
            None => {}
        }
    }
}

/// Build the `exception` wire payload: the capture's own fields plus the
/// runtime identifiers and release record described in §6.
fn exception_payload(config: &Config, capture: &aivory_core::ExceptionCapture) -> Value {
    serde_json::json!({
        "id": capture.id,
        "exception_type": capture.exception_type,
        "message": capture.message,
        "fingerprint": capture.fingerprint,
        "stack_trace": capture.stack_trace,
        "local_variables": capture.local_variables,
        "context": capture.context,
        "captured_at": capture.captured_at,
        "agent_id": config.identity.agent_id,
        "environment": config.environment,
        "runtime": env!("CARGO_PKG_NAME"),
        "runtime_version": env!("CARGO_PKG_VERSION"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "release": config.release,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
