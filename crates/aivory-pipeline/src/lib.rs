// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The Exception Pipeline (§4.E): host exception-hook registration, the
//! stack-trace grammar, the stack-key/content-fingerprint computations, and
//! capture assembly.

mod fingerprint;
mod grammar;
mod hook;
mod pipeline;

#[cfg(test)]
mod mock;

pub use hook::{ExceptionHandler, ExceptionHookSource, HookKind, RawException};
pub use pipeline::ExceptionPipeline;
