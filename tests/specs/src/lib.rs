// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! End-to-end harness: a fake collector over a real WebSocket listener, and
//! a scriptable `InspectorLink` standing in for a host debugger protocol.
//! Both drive the public `aivory-agent` API the way an embedding
//! application would, rather than reaching into any one crate's internals.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use aivory_core::{Config, InitOptions};
use aivory_debugger::{
    CallFrame, DebuggerError, InspectorEvent, InspectorLink, PauseOnExceptions, PausedEvent,
    PropertyDescriptor, RemoteValue, ScopeKind, ScopeRef,
};
use aivory_pipeline::{ExceptionHandler, ExceptionHookSource, HookKind};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;

pub fn test_options(collector_url: String) -> InitOptions {
    InitOptions { api_key: Some("test-key".to_owned()), collector_url: Some(collector_url), ..Default::default() }
}

/// Bind a local listener, accept one connection, ack `register`, optionally
/// push `send_after_register` down to the client, then collect every
/// subsequent text frame until the socket closes or `count` frames have
/// arrived.
pub async fn fake_collector(count: usize) -> anyhow::Result<(String, tokio::task::JoinHandle<Vec<String>>)> {
    fake_collector_with(count, None).await
}

pub async fn fake_collector_with(
    count: usize,
    send_after_register: Option<String>,
) -> anyhow::Result<(String, tokio::task::JoinHandle<Vec<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else { return Vec::new() };
        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else { return Vec::new() };
        let _register = ws.next().await;
        if ws.send(WsMessage::text(r#"{"type":"registered","payload":{},"timestamp":0}"#)).await.is_err() {
            return Vec::new();
        }
        if let Some(frame) = send_after_register {
            if ws.send(WsMessage::text(frame)).await.is_err() {
                return Vec::new();
            }
        }

        let mut frames = Vec::new();
        while frames.len() < count {
            match ws.next().await {
                Some(Ok(WsMessage::Text(text))) => frames.push(text.to_string()),
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
                _ => break,
            }
        }
        frames
    });

    Ok((format!("ws://{addr}/ws"), handle))
}

pub fn test_config(collector_url: String) -> anyhow::Result<Arc<Config>> {
    Ok(Arc::new(Config::resolve_with(test_options(collector_url), |_| None)?))
}

/// A scriptable [`InspectorLink`]: queued events are handed out in order;
/// once exhausted, `next_event` pends forever rather than returning `None`,
/// so a real `DebuggerSession::run` loop stays alive for the test's
/// duration instead of tearing itself down early.
#[derive(Default)]
pub struct FakeInspectorLink {
    events: Mutex<VecDeque<InspectorEvent>>,
    properties: Mutex<HashMap<String, Vec<PropertyDescriptor>>>,
    next_session_id: AtomicU64,
    resume_count: AtomicUsize,
}

impl FakeInspectorLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_event(&self, event: InspectorEvent) {
        self.events.lock().await.push_back(event);
    }

    pub async fn with_properties(&self, object_id: &str, props: Vec<PropertyDescriptor>) {
        self.properties.lock().await.insert(object_id.to_owned(), props);
    }

    pub fn resume_count(&self) -> usize {
        self.resume_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InspectorLink for FakeInspectorLink {
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
        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("dbg-session-{id}"))
    }

    async fn remove_breakpoint(&self, _session_id: &str) -> Result<(), DebuggerError> {
        Ok(())
    }

    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, DebuggerError> {
        Ok(self.properties.lock().await.get(object_id).cloned().unwrap_or_default())
    }

    async fn resume(&self) -> Result<(), DebuggerError> {
        self.resume_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&self) -> Option<InspectorEvent> {
        loop {
            if let Some(event) = self.events.lock().await.pop_front() {
                return Some(event);
            }
            std::future::pending::<()>().await;
        }
    }
}

pub fn call_frame(function_name: &str, url: &str, line: u32, scope_object_id: &str) -> CallFrame {
    CallFrame {
        function_name: function_name.to_owned(),
        url: url.to_owned(),
        line_number: line,
        column_number: 0,
        scope_chain: vec![ScopeRef { kind: ScopeKind::Local, object_id: scope_object_id.to_owned() }],
    }
}

pub fn number_property(name: &str, value: i64) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_owned(),
        value: RemoteValue {
            type_name: "number".to_owned(),
            subtype: None,
            description: Some(value.to_string()),
            primitive: Some(serde_json::json!(value)),
            object_id: None,
        },
    }
}

pub fn string_property(name: &str, value: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_owned(),
        value: RemoteValue {
            type_name: "string".to_owned(),
            subtype: None,
            description: Some(value.to_owned()),
            primitive: Some(serde_json::json!(value)),
            object_id: None,
        },
    }
}

pub fn paused_exception(
    description: &str,
    exception_type: &str,
    call_frames: Vec<CallFrame>,
    uncaught: bool,
) -> InspectorEvent {
    InspectorEvent::Paused(PausedEvent {
        reason: aivory_debugger::PauseReason::Exception,
        call_frames,
        exception_type: Some(exception_type.to_owned()),
        exception_description: Some(description.to_owned()),
        exception_uncaught: uncaught,
        hit_breakpoint_ids: Vec::new(),
    })
}

/// A hook source whose `fire` drives whatever handler was installed for a
/// given [`HookKind`], exactly the way a real host's
/// `process.on("uncaughtException", ...)` would.
#[derive(Default)]
pub struct RecordingHookSource {
    installed: Mutex<HashMap<HookKind, ExceptionHandler>>,
    exit_calls: Mutex<Vec<i32>>,
}

impl RecordingHookSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fire(&self, kind: HookKind, raw: aivory_pipeline::RawException) {
        let handler = self.installed.lock().await.get(&kind).cloned();
        if let Some(handler) = handler {
            handler(raw);
        }
    }

    pub async fn exit_calls(&self) -> Vec<i32> {
        self.exit_calls.lock().await.clone()
    }
}

#[async_trait]
impl ExceptionHookSource for RecordingHookSource {
    async fn install(&self, kind: HookKind, handler: ExceptionHandler) -> Option<ExceptionHandler> {
        self.installed.lock().await.insert(kind, handler)
    }

    async fn uninstall(&self, kind: HookKind, previous: Option<ExceptionHandler>) {
        let mut guard = self.installed.lock().await;
        match previous {
            Some(handler) => {
                guard.insert(kind, handler);
            }
            None => {
                guard.remove(&kind);
            }
        }
    }

    fn exit_process(&self, code: i32) {
        // Recorded rather than actually exiting: the test process must
        // survive to assert on the outcome. Uninstrumented contention here
        // would mean a bug in the test itself, so a missed push is fine.
        if let Ok(mut guard) = self.exit_calls.try_lock() {
            guard.push(code);
        }
    }
}
