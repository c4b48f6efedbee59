// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

use std::fmt;

/// Top-level error type shared across the capture engine.
///
/// Per the capture-path policy (never throw out of a capture path), this
/// type is used for reporting and logging only — no component propagates it
/// out to the host application. It exists so that internal `Result`
/// plumbing reads the same way across crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AivoryError {
    /// The transport is not in a state that admits the requested operation.
    NotRegistered,
    /// Authentication with the collector failed; reconnect is disabled.
    AuthFailed(String),
    /// The debugger protocol returned an error for a request.
    DebuggerProtocol(String),
    /// A harvest did not complete before its timeout.
    HarvestTimeout,
    /// An inbound or outbound message failed to parse.
    InvalidMessage(String),
    /// `InitOptions` failed to resolve into a valid `Config`.
    ConfigInvalid(String),
    /// Catch-all for conditions that should never occur but must not panic.
    Internal(String),
}

impl AivoryError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRegistered => "NOT_REGISTERED",
            Self::AuthFailed(_) => "AUTH_FAILED",
            Self::DebuggerProtocol(_) => "DEBUGGER_PROTOCOL",
            Self::HarvestTimeout => "HARVEST_TIMEOUT",
            Self::InvalidMessage(_) => "INVALID_MESSAGE",
            Self::ConfigInvalid(_) => "CONFIG_INVALID",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl fmt::Display for AivoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered => write!(f, "transport is not registered"),
            Self::AuthFailed(msg) => write!(f, "authentication failed: {msg}"),
            Self::DebuggerProtocol(msg) => write!(f, "debugger protocol error: {msg}"),
            Self::HarvestTimeout => write!(f, "harvest did not complete before timeout"),
            Self::InvalidMessage(msg) => write!(f, "invalid message: {msg}"),
            Self::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AivoryError {}

impl From<crate::config::ConfigError> for AivoryError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::ConfigInvalid(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
