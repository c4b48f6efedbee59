// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Conversions between [`aivory_core::Message`] and the raw WebSocket frame,
//! plus the `register` / `heartbeat` payload builders.

use aivory_core::{Config, Message};
use tokio_tungstenite::tungstenite::Message as WsMessage;

fn now_ms() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub fn encode(message: &Message) -> Option<WsMessage> {
    serde_json::to_string(message).ok().map(WsMessage::text)
}

pub fn decode(frame: &str) -> Option<Message> {
    serde_json::from_str(frame).ok()
}

/// Build the `register` message sent immediately on entering `Connected`.
pub fn register_message(config: &Config) -> Message {
    let payload = serde_json::json!({
        "agent_id": config.identity.agent_id,
        "hostname": config.identity.hostname,
        "environment": config.environment,
        "release": config.release,
    });
    Message::new("register", payload, now_ms())
}

/// Build a `heartbeat` message, emitted every 30s while `Registered`.
pub fn heartbeat_message(config: &Config) -> Message {
    let payload = serde_json::json!({ "agent_id": config.identity.agent_id });
    Message::new("heartbeat", payload, now_ms())
}

pub fn stamped(kind: impl Into<String>, payload: serde_json::Value) -> Message {
    Message::new(kind, payload, now_ms())
}

#[cfg(test)]
#[path = "wire_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
