// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The wire-facing half of the agent: a reconnecting WebSocket client to the
//! collector, a bounded outbound buffer for the gaps between connections,
//! and the inbound command channel that feeds the debugger session (§4.B).

mod backoff;
mod commands;
mod connect;
mod queue;
mod session;
mod state;
mod wire;

pub use commands::InboundCommand;
pub use session::{spawn, TransportHandle};
pub use state::ConnectionState;
