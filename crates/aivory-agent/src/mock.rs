// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Minimal host-side stand-ins for this crate's tests. `aivory-debugger`'s
//! own `MockLink` and `aivory-pipeline`'s own `MockHookSource` are
//! `#[cfg(test)]`-private to their crates, so `aivory-agent` needs its own.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use aivory_debugger::{
    DebuggerError, InspectorEvent, InspectorLink, PauseOnExceptions, PropertyDescriptor,
};
use aivory_pipeline::{ExceptionHandler, ExceptionHookSource, HookKind};

/// An [`InspectorLink`] that never produces an event; enough to exercise
/// lifecycle start/teardown without a real host debugger attached.
#[derive(Default)]
pub struct NullInspectorLink;

#[async_trait]
impl InspectorLink for NullInspectorLink {
    async fn enable(&self) -> Result<(), DebuggerError> {
        Ok(())
    }

    async fn disable(&self) -> Result<(), DebuggerError> {
        Ok(())
    }

    async fn set_pause_on_exceptions(&self, _state: PauseOnExceptions) -> Result<(), DebuggerError> {
        Ok(())
    }

    async fn set_breakpoint_by_url(
        &self,
        _url_regex: &str,
        _zero_indexed_line: u32,
        _condition: Option<&str>,
    ) -> Result<String, DebuggerError> {
        Ok("dbg-session-0".to_owned())
    }

    async fn remove_breakpoint(&self, _session_id: &str) -> Result<(), DebuggerError> {
        Ok(())
    }

    async fn get_properties(&self, _object_id: &str) -> Result<Vec<PropertyDescriptor>, DebuggerError> {
        Ok(Vec::new())
    }

    async fn resume(&self) -> Result<(), DebuggerError> {
        Ok(())
    }

    async fn next_event(&self) -> Option<InspectorEvent> {
        std::future::pending().await
    }
}

/// An [`ExceptionHookSource`] that records install/uninstall/exit calls but
/// never fires a handler on its own — tests drive the pipeline through its
/// manual `capture` entry point instead of simulating a host hook firing.
#[derive(Default)]
pub struct NullHookSource {
    installs: AtomicUsize,
    uninstalls: AtomicUsize,
    exits: AtomicUsize,
    installed: Mutex<Vec<(HookKind, ExceptionHandler)>>,
}

impl NullHookSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    pub fn uninstall_count(&self) -> usize {
        self.uninstalls.load(Ordering::SeqCst)
    }

    pub fn exit_count(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExceptionHookSource for NullHookSource {
    async fn install(&self, kind: HookKind, handler: ExceptionHandler) -> Option<ExceptionHandler> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        self.installed.lock().await.push((kind, handler));
        None
    }

    async fn uninstall(&self, _kind: HookKind, _previous: Option<ExceptionHandler>) {
        self.uninstalls.fetch_add(1, Ordering::SeqCst);
    }

    fn exit_process(&self, _code: i32) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}
