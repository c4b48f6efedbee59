// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The Debugger Session (§4.C): owns the inspector connection, enables
//! pause-on-exception, installs/removes breakpoints, and dispatches paused
//! events — harvesting locals before every resume.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use aivory_core::{Breakpoint, CapturedValue, StackFrame};
use aivory_transport::InboundCommand;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::cache::{DedupSet, Harvest, LocalsCache};
use crate::capture_source::{CaptureSource, HARVEST_AWAIT_TIMEOUT};
use crate::harvester;
use crate::link::{InspectorEvent, InspectorLink, PauseOnExceptions, PauseReason, PausedEvent};
use crate::ratelimit::RateLimiter;
use crate::registry::{self, BreakpointRegistry};

fn now_ms() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// A breakpoint pause that matched an installed breakpoint, ready to be
/// reported to the collector as `breakpoint_hit`.
#[derive(Debug, Clone)]
pub struct BreakpointHit {
    pub backend_id: String,
    pub locals: BTreeMap<String, CapturedValue>,
    pub stack_trace: Vec<StackFrame>,
}

/// An exception the debugger observed on a pause, with its locals already
/// harvested, ready to be reported as `exception` (§8 property 7: the
/// debugger path is the one that actually emits when it sees the error
/// first; a later hook firing for the same fingerprint is the one that gets
/// suppressed, via [`CaptureSource::was_sent_via_debugger`]).
#[derive(Debug, Clone)]
pub struct DetectedException {
    pub exception_type: String,
    pub message: String,
    pub locals: BTreeMap<String, CapturedValue>,
    pub stack_trace: Vec<StackFrame>,
}

/// The conventional leading `Name: message` line of a stack description,
/// with the type prefix stripped. Falls back to the whole first line (or the
/// type itself, if the description is empty) rather than guessing further.
fn message_from_description(exception_type: &str, description: &str) -> String {
    let first_line = description.lines().next().unwrap_or_default().trim();
    let stripped =
        first_line.strip_prefix(exception_type).and_then(|s| s.strip_prefix(':')).map(str::trim).filter(|s| !s.is_empty());
    stripped.or_else(|| Some(first_line).filter(|s| !s.is_empty())).unwrap_or(exception_type).to_owned()
}

pub struct DebuggerSession {
    link: Arc<dyn InspectorLink>,
    registry: Mutex<BreakpointRegistry>,
    cache: LocalsCache,
    dedup: Mutex<DedupSet>,
    rate_limiter: Mutex<RateLimiter>,
    max_capture_depth: usize,
    max_string_length: usize,
    max_collection_size: usize,
    scope_depth: u8,
}

impl DebuggerSession {
    pub fn new(
        link: Arc<dyn InspectorLink>,
        max_capture_depth: usize,
        max_string_length: usize,
        max_collection_size: usize,
        scope_depth: u8,
    ) -> Self {
        Self {
            link,
            registry: Mutex::new(BreakpointRegistry::new()),
            cache: LocalsCache::new(),
            dedup: Mutex::new(DedupSet::new()),
            rate_limiter: Mutex::new(RateLimiter::default()),
            max_capture_depth,
            max_string_length,
            max_collection_size,
            scope_depth,
        }
    }

    /// Enable the inspector and declare pause-on-all-exceptions.
    pub async fn enable(&self) -> Result<(), crate::link::DebuggerError> {
        self.link.enable().await?;
        self.link.set_pause_on_exceptions(PauseOnExceptions::All).await
    }

    /// Install or replace (Open Question (c)) a breakpoint by `backend_id`.
    pub async fn set_breakpoint(
        &self,
        backend_id: String,
        file_path: String,
        line_number: u32,
        condition: Option<String>,
    ) {
        let breakpoint = Breakpoint {
            backend_id: backend_id.clone(),
            session_id: None,
            file_path_pattern: file_path.clone(),
            line_number,
            condition: condition.clone(),
        };
        let zero_indexed_line = breakpoint.zero_indexed_line();
        let pattern = registry::url_regex_pattern(&file_path);

        match self.link.set_breakpoint_by_url(&pattern, zero_indexed_line, condition.as_deref()).await {
            Ok(session_id) => {
                let previous = {
                    let mut registry = self.registry.lock().await;
                    let previous = registry.upsert(breakpoint);
                    registry.attach_session_id(&backend_id, session_id);
                    previous
                };
                if let Some(previous) = previous {
                    if let Some(old_session_id) = previous.session_id {
                        let _ = self.link.remove_breakpoint(&old_session_id).await;
                    }
                }
                tracing::debug!(backend_id, "breakpoint installed");
            }
            Err(err) => {
                tracing::warn!(backend_id, %err, "failed to install breakpoint, dropping");
            }
        }
    }

    /// Best-effort removal: the local entry is dropped regardless of
    /// whether the debugger acknowledges.
    pub async fn remove_breakpoint(&self, backend_id: &str) {
        let removed = self.registry.lock().await.remove(backend_id);
        if let Some(breakpoint) = removed {
            if let Some(session_id) = breakpoint.session_id {
                let _ = self.link.remove_breakpoint(&session_id).await;
            }
        }
    }

    /// Remove every breakpoint and disable the inspector.
    pub async fn teardown(&self) {
        let breakpoints = self.registry.lock().await.drain();
        for breakpoint in breakpoints {
            if let Some(session_id) = breakpoint.session_id {
                let _ = self.link.remove_breakpoint(&session_id).await;
            }
        }
        let _ = self.link.disable().await;
    }

    /// Apply one decoded inbound command (§9 `command_sink`).
    pub async fn apply_command(&self, command: InboundCommand) {
        match command {
            InboundCommand::SetBreakpoint { id, file_path, line_number, condition } => {
                self.set_breakpoint(id, file_path, line_number, condition).await;
            }
            InboundCommand::RemoveBreakpoint { id } => {
                self.remove_breakpoint(&id).await;
            }
        }
    }

    async fn harvest_now(&self, call_frames: &[crate::link::CallFrame]) -> Harvest {
        harvester::harvest(
            self.link.as_ref(),
            call_frames,
            self.max_capture_depth,
            self.max_string_length,
            self.max_collection_size,
            self.scope_depth,
        )
        .await
    }

    async fn handle_exception_pause(&self, event: &PausedEvent, exceptions: &mpsc::UnboundedSender<DetectedException>) {
        let admitted = self.rate_limiter.lock().await.admit(Instant::now());
        if !admitted {
            tracing::debug!("rate limit tripped, resuming without harvest");
            let _ = self.link.resume().await;
            return;
        }

        let description = event.exception_description.clone().unwrap_or_default();
        let key = aivory_core::keys::stack_key(&description, now_ms());

        self.cache.begin_pending(&key).await;
        let harvest = self.harvest_now(&event.call_frames).await;
        self.cache.complete(&key, harvest.clone()).await;

        // A caught exception pauses the inspector the same as an uncaught one
        // (pause-on-exceptions doesn't distinguish them), but only an
        // uncaught one will ever reach a host exception hook — reporting a
        // caught one here would double up with the caller's own
        // `capture_exception`, which is the only path a caught exception is
        // ever meant to be reported through.
        if matches!(event.reason, PauseReason::Exception) && event.exception_uncaught {
            let exception_type = event.exception_type.clone().unwrap_or_else(|| "Error".to_owned());
            let top_lines: Vec<u32> = event.call_frames.iter().take(3).map(|f| f.line_number + 1).collect();
            let fingerprint = aivory_core::keys::dedup_fingerprint(&exception_type, &top_lines);
            self.dedup.lock().await.insert(fingerprint);

            let message = message_from_description(&exception_type, &description);
            let _ = exceptions.send(DetectedException {
                exception_type,
                message,
                locals: harvest.locals,
                stack_trace: harvest.stack_trace,
            });
        }

        let _ = self.link.resume().await;
    }

    async fn handle_breakpoint_pause(&self, event: &PausedEvent, hits: &mpsc::UnboundedSender<BreakpointHit>) {
        let matched: Vec<Breakpoint> = {
            let registry = self.registry.lock().await;
            event.hit_breakpoint_ids.iter().filter_map(|id| registry.find_by_session_id(id).cloned()).collect()
        };

        if !matched.is_empty() {
            let harvest = self.harvest_now(&event.call_frames).await;
            for breakpoint in matched {
                let _ = hits.send(BreakpointHit {
                    backend_id: breakpoint.backend_id,
                    locals: harvest.locals.clone(),
                    stack_trace: harvest.stack_trace.clone(),
                });
            }
        }

        let _ = self.link.resume().await;
    }

    async fn handle_paused(
        &self,
        event: PausedEvent,
        hits: &mpsc::UnboundedSender<BreakpointHit>,
        exceptions: &mpsc::UnboundedSender<DetectedException>,
    ) {
        match event.reason {
            PauseReason::Exception | PauseReason::PromiseRejection => {
                self.handle_exception_pause(&event, exceptions).await
            }
            PauseReason::BreakpointHit => self.handle_breakpoint_pause(&event, hits).await,
            PauseReason::Other => {
                let _ = self.link.resume().await;
            }
        }
    }

    /// Drive the inspector's event stream until it closes or `cancel` fires.
    /// Breakpoint hits are published on `hits`, detected exceptions on
    /// `exceptions`; inbound breakpoint commands arrive on `commands` (the
    /// transport's `command_sink`).
    pub async fn run(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<InboundCommand>,
        hits: mpsc::UnboundedSender<BreakpointHit>,
        exceptions: mpsc::UnboundedSender<DetectedException>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => {
                    match command {
                        Some(command) => self.apply_command(command).await,
                        None => break,
                    }
                }
                event = self.link.next_event() => {
                    match event {
                        Some(InspectorEvent::Paused(paused)) => self.handle_paused(paused, &hits, &exceptions).await,
                        Some(InspectorEvent::ScriptParsed(_)) => {}
                        None => break,
                    }
                }
            }
        }
        self.teardown().await;
    }
}

#[async_trait]
impl CaptureSource for DebuggerSession {
    async fn locals_for_stack_key(&self, key: &str) -> Option<Harvest> {
        self.cache.locals_for_stack_key(key, HARVEST_AWAIT_TIMEOUT).await
    }

    async fn was_sent_via_debugger(&self, fingerprint: &str) -> bool {
        self.dedup.lock().await.contains(fingerprint)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
