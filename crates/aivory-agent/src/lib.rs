// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The public SDK surface: `init`, `capture_exception`, `set_context`,
//! `set_user`, `shutdown`, `is_initialized`, and an error-middleware helper,
//! wiring `aivory-core`, `aivory-transport`, `aivory-debugger`, and
//! `aivory-pipeline` into one process-wide agent.

mod agent;
mod lifecycle;
pub mod middleware;

#[cfg(test)]
mod mock;

pub use agent::{capture_exception, init, is_initialized, set_context, set_user, shutdown};
pub use aivory_core::{AivoryError, InitOptions, UserInfo};
pub use aivory_debugger::InspectorLink;
pub use aivory_pipeline::{ExceptionHookSource, HookKind, RawException};
pub use middleware::RequestContext;
