// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Shared configuration, identity, wire model, and error types for the
//! aivory capture engine.
//!
//! This crate has no knowledge of the debugger protocol or the transport
//! socket — it only defines the immutable facts every other crate agrees
//! on: what the agent looks like on the wire, and how it is configured.

pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod keys;
pub mod logging;
pub mod model;
pub mod release;

pub use config::{Config, InitOptions};
pub use context::{ContextStore, UserInfo};
pub use error::AivoryError;
pub use identity::Identity;
pub use model::{
    Breakpoint, CapturedValue, ExceptionCapture, Message, StackFrame, TypeTag,
};
pub use release::ReleaseRecord;
