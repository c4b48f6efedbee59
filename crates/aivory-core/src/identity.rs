// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Agent identity: a stable-for-process `agent_id` plus the local hostname.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;

/// Identity of this agent process, computed once at `init` time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub agent_id: String,
    pub hostname: String,
}

impl Identity {
    /// Build a fresh identity: `agent-<epoch16>-<4 random bytes hex>`.
    pub fn generate() -> Self {
        Self { agent_id: generate_agent_id(), hostname: local_hostname() }
    }
}

fn generate_agent_id() -> String {
    let epoch16 = format!("{:016x}", epoch_millis());
    let mut bytes = [0u8; 4];
    rand::rng().fill_bytes(&mut bytes);
    let suffix = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
    format!("agent-{epoch16}-{suffix}")
}

fn epoch_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

fn local_hostname() -> String {
    // Falls back to a sentinel rather than failing construction of the
    // identity if neither the env var nor the OS call turns up a name.
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| gethostname::gethostname().into_string().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown-host".to_owned())
}

#[cfg(test)]
#[path = "identity_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
