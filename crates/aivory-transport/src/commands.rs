// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Inbound commands forwarded to subscribers of the transport's
//! `command_sink` (§9 Design Notes: the event-emitter fan-out between
//! Transport and Debugger Session becomes an explicit channel).

use serde::{Deserialize, Serialize};

/// A breakpoint instruction received from the collector, decoded from an
/// inbound `set_breakpoint` / `remove_breakpoint` envelope payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundCommand {
    SetBreakpoint {
        id: String,
        file_path: String,
        line_number: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    RemoveBreakpoint {
        id: String,
    },
}

impl InboundCommand {
    /// Decode a `set_breakpoint` / `remove_breakpoint` payload. Any other
    /// shape is not a command this channel carries.
    pub fn from_payload(kind: &str, payload: &serde_json::Value) -> Option<Self> {
        match kind {
            "set_breakpoint" => Some(Self::SetBreakpoint {
                id: payload.get("id")?.as_str()?.to_owned(),
                file_path: payload.get("file_path")?.as_str()?.to_owned(),
                line_number: payload.get("line_number")?.as_u64()? as u32,
                condition: payload.get("condition").and_then(|v| v.as_str()).map(str::to_owned),
            }),
            "remove_breakpoint" => {
                Some(Self::RemoveBreakpoint { id: payload.get("id")?.as_str()?.to_owned() })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
