// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! [`InspectorLink`]: the host-agnostic boundary onto the debugger/inspector
//! protocol a real host runtime exposes (V8 Inspector, JSR Inspector, a
//! CDP-style remote, ...). This crate never talks to a concrete host; it is
//! handed an `Arc<dyn InspectorLink>` by the embedding integration and
//! drives it the same way regardless of what is on the other end.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebuggerError {
    NotEnabled,
    Protocol(String),
}

impl std::fmt::Display for DebuggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnabled => write!(f, "debugger is not enabled"),
            Self::Protocol(msg) => write!(f, "debugger protocol error: {msg}"),
        }
    }
}

impl std::error::Error for DebuggerError {}

/// Which exceptions trigger a pause, mirroring the inspector's
/// `setPauseOnExceptions` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOnExceptions {
    None,
    Uncaught,
    All,
}

#[derive(Debug, Clone)]
pub struct ScriptInfo {
    pub script_id: String,
    pub url: String,
}

/// A variable-binding region reported by the debugger for one call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Local,
    Closure,
    Catch,
    Block,
    Module,
    With,
    Script,
    Global,
}

#[derive(Debug, Clone)]
pub struct ScopeRef {
    pub kind: ScopeKind,
    pub object_id: String,
}

/// One frame of a paused call stack, in debugger-native (0-indexed)
/// coordinates.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub function_name: String,
    pub url: String,
    pub line_number: u32,
    pub column_number: u32,
    pub scope_chain: Vec<ScopeRef>,
}

/// A property of a remote object, as reported by `getProperties`.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub value: RemoteValue,
}

/// A value as reported by the debugger: never the value itself, only its
/// shape and, for primitives, an inline copy.
#[derive(Debug, Clone)]
pub struct RemoteValue {
    pub type_name: String,
    pub subtype: Option<String>,
    pub description: Option<String>,
    pub primitive: Option<serde_json::Value>,
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    Exception,
    PromiseRejection,
    BreakpointHit,
    Other,
}

#[derive(Debug, Clone)]
pub struct PausedEvent {
    pub reason: PauseReason,
    pub call_frames: Vec<CallFrame>,
    pub exception_type: Option<String>,
    pub exception_description: Option<String>,
    /// Mirrors the inspector's own `uncaught` flag on an exception-reason
    /// pause: `true` when nothing in the call stack will catch this error.
    /// Meaningless for any other [`PauseReason`].
    pub exception_uncaught: bool,
    /// Debugger-assigned breakpoint ids the pause matched, for `BreakpointHit`.
    pub hit_breakpoint_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum InspectorEvent {
    ScriptParsed(ScriptInfo),
    Paused(PausedEvent),
}

/// The pluggable duplex channel onto the host debugger protocol.
///
/// Implementations own the actual wire connection (a CDP WebSocket, an
/// in-process V8 binding, ...); everything above this trait is host-agnostic.
#[async_trait]
pub trait InspectorLink: Send + Sync {
    async fn enable(&self) -> Result<(), DebuggerError>;
    async fn disable(&self) -> Result<(), DebuggerError>;
    async fn set_pause_on_exceptions(&self, state: PauseOnExceptions) -> Result<(), DebuggerError>;

    /// Install a URL-regex breakpoint, returning the debugger-assigned
    /// session id.
    async fn set_breakpoint_by_url(
        &self,
        url_regex: &str,
        zero_indexed_line: u32,
        condition: Option<&str>,
    ) -> Result<String, DebuggerError>;

    async fn remove_breakpoint(&self, session_id: &str) -> Result<(), DebuggerError>;

    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, DebuggerError>;

    async fn resume(&self) -> Result<(), DebuggerError>;

    /// Block until the next script-parsed or paused notification. Returns
    /// `None` once the link is closed.
    async fn next_event(&self) -> Option<InspectorEvent>;
}
