// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The host exception-hook abstraction (§4.E): a pluggable stand-in for a
//! host runtime's `uncaughtException`/`unhandledRejection` hook pair,
//! mirroring how `aivory_debugger::InspectorLink` stands in for the
//! debugger protocol.

use std::sync::Arc;

use async_trait::async_trait;

/// One exception or rejection exactly as the host hands it to a hook,
/// before the stack-trace grammar is applied.
#[derive(Debug, Clone)]
pub struct RawException {
    pub exception_type: String,
    pub message: String,
    /// The full textual stack description, conventionally a `Name: message`
    /// line followed by `at ...` frame lines.
    pub stack_text: String,
}

/// Which of the two host hooks fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    UncaughtException,
    UnhandledRejection,
}

pub type ExceptionHandler = Arc<dyn Fn(RawException) + Send + Sync>;

/// A host runtime's pair of global exception hooks. Implementations install
/// one handler per kind and hand back whatever handler (if any) was already
/// registered, so the pipeline can chain to it (§4.E step 7).
#[async_trait]
pub trait ExceptionHookSource: Send + Sync {
    /// Install `handler` for `kind`, returning the previously-installed
    /// handler, if any.
    async fn install(&self, kind: HookKind, handler: ExceptionHandler) -> Option<ExceptionHandler>;

    /// Restore `previous` (or clear the hook if `None`) for `kind`.
    async fn uninstall(&self, kind: HookKind, previous: Option<ExceptionHandler>);

    /// Terminate the host process with `code`. Used after an uncaught
    /// exception with no prior handler, once Transport has had a chance to
    /// flush (§4.E step 7, §5 Teardown).
    fn exit_process(&self, code: i32);
}
