// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Breakpoint registry, keyed by the collector-assigned `backend_id` (§4.C).
//!
//! A duplicate `backend_id` in `set_breakpoint` replaces the existing entry
//! (Open Question (c)): the collector is the source of truth for a
//! breakpoint's identity, so a second `set_breakpoint` for the same id is
//! read as "update", not "reject".

use std::collections::HashMap;

use aivory_core::Breakpoint;
use regex::escape;

/// Build the URL-regex pattern the debugger matches scripts against,
/// tolerant of either path-separator style.
pub fn url_regex_pattern(file_path: &str) -> String {
    let escaped = escape(file_path).replace('/', "[\\/]");
    format!(".*{escaped}$")
}

#[derive(Default)]
pub struct BreakpointRegistry {
    by_backend_id: HashMap<String, Breakpoint>,
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a breakpoint by `backend_id`, returning the entry
    /// it replaced, if any.
    pub fn upsert(&mut self, breakpoint: Breakpoint) -> Option<Breakpoint> {
        self.by_backend_id.insert(breakpoint.backend_id.clone(), breakpoint)
    }

    /// Record the debugger-assigned session id once installation succeeds.
    pub fn attach_session_id(&mut self, backend_id: &str, session_id: String) {
        if let Some(bp) = self.by_backend_id.get_mut(backend_id) {
            bp.session_id = Some(session_id);
        }
    }

    /// Remove a breakpoint regardless of whether the debugger acknowledged
    /// the removal (§4.C removal is best-effort).
    pub fn remove(&mut self, backend_id: &str) -> Option<Breakpoint> {
        self.by_backend_id.remove(backend_id)
    }

    pub fn find_by_session_id(&self, session_id: &str) -> Option<&Breakpoint> {
        self.by_backend_id.values().find(|bp| bp.session_id.as_deref() == Some(session_id))
    }

    pub fn len(&self) -> usize {
        self.by_backend_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_backend_id.is_empty()
    }

    /// Drain every breakpoint, e.g. for teardown where each must still be
    /// requested for removal from the debugger.
    pub fn drain(&mut self) -> Vec<Breakpoint> {
        self.by_backend_id.drain().map(|(_, bp)| bp).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
