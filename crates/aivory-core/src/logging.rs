// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Tracing setup for the agent.
//!
//! The agent is embedded in a host application, so it never installs a
//! global subscriber on the host's behalf unless the host opts in — calling
//! [`init_tracing`] is optional and idempotent. Debug-gated detail (§7:
//! "logged (when debug)") is emitted as `tracing::debug!`, which the host's
//! own subscriber (if any) can already choose to surface via `RUST_LOG`.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a `tracing-subscriber` `EnvFilter` subscriber once per process.
///
/// `debug` raises the default filter to `debug` for the `aivory` target
/// prefix; otherwise only `info` and above are shown. Respects `RUST_LOG`
/// when set, matching the teacher's `--log-level`/`RUST_LOG` precedence.
pub fn init_tracing(debug: bool) {
    INIT.call_once(|| {
        let default_filter = if debug { "aivory=debug,info" } else { "aivory=info,warn" };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
