// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! A scriptable [`InspectorLink`] used across this crate's test suites.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::link::{
    DebuggerError, InspectorEvent, InspectorLink, PauseOnExceptions, PropertyDescriptor,
};

#[derive(Default)]
pub struct MockLink {
    properties: Mutex<HashMap<String, Vec<PropertyDescriptor>>>,
    events: Mutex<VecDeque<InspectorEvent>>,
    removed_breakpoints: Mutex<Vec<String>>,
    next_session_id: AtomicU64,
    resume_count: AtomicUsize,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_properties(&self, object_id: &str, props: Vec<PropertyDescriptor>) {
        self.properties.lock().await.insert(object_id.to_owned(), props);
    }

    pub async fn push_event(&self, event: InspectorEvent) {
        self.events.lock().await.push_back(event);
    }

    pub fn resume_count(&self) -> usize {
        self.resume_count.load(Ordering::SeqCst)
    }

    pub async fn removed_breakpoints(&self) -> Vec<String> {
        self.removed_breakpoints.lock().await.clone()
    }
}

#[async_trait]
impl InspectorLink for MockLink {
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

    async fn remove_breakpoint(&self, session_id: &str) -> Result<(), DebuggerError> {
        self.removed_breakpoints.lock().await.push(session_id.to_owned());
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
        self.events.lock().await.pop_front()
    }
}
