// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Scriptable test doubles shared across this crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::Mutex;

use aivory_debugger::{CaptureSource, Harvest};

use crate::hook::{ExceptionHandler, ExceptionHookSource, HookKind, RawException};

#[derive(Default)]
pub struct MockHookSource {
    handlers: Mutex<HashMap<HookKind, ExceptionHandler>>,
    priors_to_return: Mutex<HashMap<HookKind, ExceptionHandler>>,
    uninstalled: Mutex<Vec<HookKind>>,
    exit_calls: AtomicUsize,
    last_exit_code: StdMutex<Option<i32>>,
}

impl MockHookSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_prior(&self, kind: HookKind, handler: ExceptionHandler) {
        self.priors_to_return.lock().await.insert(kind, handler);
    }

    /// Invoke whatever handler is currently installed for `kind`, as the
    /// host would on an actual exception.
    pub async fn fire(&self, kind: HookKind, raw: RawException) {
        let handler = self.handlers.lock().await.get(&kind).cloned();
        if let Some(handler) = handler {
            handler(raw);
        }
    }

    pub async fn uninstalled_kinds(&self) -> Vec<HookKind> {
        self.uninstalled.lock().await.clone()
    }

    pub fn exit_calls(&self) -> usize {
        self.exit_calls.load(Ordering::SeqCst)
    }

    pub fn last_exit_code(&self) -> Option<i32> {
        *self.last_exit_code.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ExceptionHookSource for MockHookSource {
    async fn install(&self, kind: HookKind, handler: ExceptionHandler) -> Option<ExceptionHandler> {
        self.handlers.lock().await.insert(kind, handler);
        self.priors_to_return.lock().await.remove(&kind)
    }

    async fn uninstall(&self, kind: HookKind, _previous: Option<ExceptionHandler>) {
        self.uninstalled.lock().await.push(kind);
        self.handlers.lock().await.remove(&kind);
    }

    fn exit_process(&self, code: i32) {
        self.exit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_exit_code.lock().unwrap_or_else(|e| e.into_inner()) = Some(code);
    }
}

/// A [`CaptureSource`] double whose harvest and dedup answers are
/// pre-scripted by the test.
#[derive(Default)]
pub struct MockCaptureSource {
    harvest: Mutex<Option<Harvest>>,
    dedup: Mutex<HashSet<String>>,
}

impl MockCaptureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_harvest(&self, harvest: Harvest) {
        *self.harvest.lock().await = Some(harvest);
    }

    pub async fn mark_sent_via_debugger(&self, fingerprint: impl Into<String>) {
        self.dedup.lock().await.insert(fingerprint.into());
    }
}

#[async_trait]
impl CaptureSource for MockCaptureSource {
    async fn locals_for_stack_key(&self, _key: &str) -> Option<Harvest> {
        self.harvest.lock().await.clone()
    }

    async fn was_sent_via_debugger(&self, fingerprint: &str) -> bool {
        self.dedup.lock().await.contains(fingerprint)
    }
}
