// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The running agent's owned resources and its teardown ordering (§5
//! Teardown): uninstall exception hooks, remove breakpoints and disable the
//! debugger, then close the transport — implemented explicitly here rather
//! than relied on through `Drop`, since `Drop` order across independently
//! owned `Arc`s isn't something Rust lets us control.

use std::sync::Arc;

use aivory_core::{AivoryError, Config, ContextStore, InitOptions};
use aivory_debugger::{BreakpointHit, CaptureSource, DebuggerSession, DetectedException, InspectorLink};
use aivory_pipeline::{ExceptionHookSource, ExceptionPipeline};
use aivory_transport::TransportHandle;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Lifecycle {
    pub config: Arc<Config>,
    pub context: Arc<ContextStore>,
    pub pipeline: Arc<ExceptionPipeline>,
    transport: TransportHandle,
    transport_cancel: CancellationToken,
    debugger_cancel: CancellationToken,
    debugger_task: Mutex<Option<JoinHandle<()>>>,
    hits_task: Mutex<Option<JoinHandle<()>>>,
    exceptions_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle").finish_non_exhaustive()
    }
}

impl Lifecycle {
    pub async fn start(
        options: InitOptions,
        inspector: Arc<dyn InspectorLink>,
        hooks: Arc<dyn ExceptionHookSource>,
    ) -> Result<Arc<Self>, AivoryError> {
        let config = Arc::new(Config::resolve(options)?);
        aivory_core::logging::init_tracing(config.debug);
        let context = Arc::new(ContextStore::new());

        let (transport, commands, transport_cancel) = aivory_transport::spawn(Arc::clone(&config));

        let debugger = Arc::new(DebuggerSession::new(
            inspector,
            config.max_capture_depth,
            config.max_string_length,
            config.max_collection_size,
            config.scope_depth,
        ));
        debugger.enable().await.map_err(|err| AivoryError::DebuggerProtocol(err.to_string()))?;

        let debugger_cancel = CancellationToken::new();
        let (hits_tx, mut hits_rx) = mpsc::unbounded_channel();
        let (exceptions_tx, mut exceptions_rx) = mpsc::unbounded_channel::<DetectedException>();
        let debugger_task = tokio::spawn(Arc::clone(&debugger).run(
            commands,
            hits_tx,
            exceptions_tx,
            debugger_cancel.clone(),
        ));

        let hits_transport = transport.clone();
        let hits_task = tokio::spawn(async move {
            while let Some(hit) = hits_rx.recv().await {
                hits_transport.send("breakpoint_hit", breakpoint_hit_payload(&hit));
            }
        });

        let pipeline = ExceptionPipeline::new(
            Arc::clone(&config),
            hooks,
            debugger as Arc<dyn CaptureSource>,
            Arc::clone(&context),
            transport.clone(),
        );
        Arc::clone(&pipeline).install().await;

        let exceptions_pipeline = Arc::clone(&pipeline);
        let exceptions_task = tokio::spawn(async move {
            while let Some(detected) = exceptions_rx.recv().await {
                exceptions_pipeline.report_from_debugger(detected).await;
            }
        });

        tracing::info!(agent_id = %config.identity.agent_id, "agent initialized");

        Ok(Arc::new(Self {
            config,
            context,
            pipeline,
            transport,
            transport_cancel,
            debugger_cancel,
            debugger_task: Mutex::new(Some(debugger_task)),
            hits_task: Mutex::new(Some(hits_task)),
            exceptions_task: Mutex::new(Some(exceptions_task)),
        }))
    }

    /// §5 Teardown, in the mandated order: hooks, then breakpoints and the
    /// debugger, then the transport.
    pub async fn teardown(&self) {
        self.pipeline.uninstall().await;

        self.debugger_cancel.cancel();
        if let Some(task) = self.debugger_task.lock().await.take() {
            let _ = task.await;
        }
        if let Some(task) = self.hits_task.lock().await.take() {
            let _ = task.await;
        }
        if let Some(task) = self.exceptions_task.lock().await.take() {
            let _ = task.await;
        }

        self.transport.shutdown();
        self.transport_cancel.cancel();

        tracing::info!(agent_id = %self.config.identity.agent_id, "agent shut down");
    }
}

fn breakpoint_hit_payload(hit: &BreakpointHit) -> Value {
    serde_json::json!({
        "breakpoint_id": hit.backend_id,
        "local_variables": hit.locals,
        "stack_trace": hit.stack_trace,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
