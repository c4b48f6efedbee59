// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The Debugger Session and Variable Harvester: everything that talks to a
//! paused host runtime through a pluggable [`link::InspectorLink`].

mod cache;
mod capture_source;
mod harvester;
mod link;
mod ratelimit;
mod registry;
mod session;

#[cfg(test)]
mod mock;

pub use cache::Harvest;
pub use capture_source::{CaptureSource, HARVEST_AWAIT_TIMEOUT};
pub use link::{
    CallFrame, DebuggerError, InspectorEvent, InspectorLink, PauseOnExceptions, PauseReason,
    PausedEvent, PropertyDescriptor, RemoteValue, ScopeKind, ScopeRef, ScriptInfo,
};
pub use registry::url_regex_pattern;
pub use session::{BreakpointHit, DebuggerSession, DetectedException};
