// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The capture engine's shared data model (§3): captured values, stack
//! frames, exception captures, breakpoints, and the collector wire
//! envelope. Every invariant described in the spec is enforced at
//! construction time here, not re-checked ad hoc by callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The fixed set of value kinds a [`CapturedValue`] can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeTag {
    Undefined,
    Null,
    Boolean,
    Number,
    Bigint,
    String,
    Symbol,
    Function,
    Array,
    Map,
    Set,
    Error,
    Date,
    Regexp,
    ObjectOfClass,
}

/// A bounded recursive description of one observed value (§3 CapturedValue).
///
/// Constructed only through [`CapturedValue::leaf`], [`CapturedValue::with_children`],
/// or [`CapturedValue::with_array_elements`] so the truncation and bound
/// invariants always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedValue {
    pub name: String,
    pub type_tag: TypeTag,
    pub value: String,
    pub is_null: bool,
    pub is_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, CapturedValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_elements: Option<Vec<CapturedValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_length: Option<usize>,
}

impl CapturedValue {
    /// Build a leaf (non-container) captured value, truncating `value` to
    /// `max_string_length` and setting `is_truncated` accordingly.
    pub fn leaf(name: impl Into<String>, type_tag: TypeTag, value: impl Into<String>, max_string_length: usize) -> Self {
        let (value, is_truncated) = truncate(value.into(), max_string_length);
        Self {
            name: name.into(),
            type_tag,
            value,
            is_null: matches!(type_tag, TypeTag::Null | TypeTag::Undefined),
            is_truncated,
            children: None,
            array_elements: None,
            array_length: None,
        }
    }

    /// Attach a recursed object's own-property children to an existing leaf.
    pub fn with_children(mut self, children: BTreeMap<String, CapturedValue>) -> Self {
        self.children = Some(children);
        self
    }

    /// Attach array elements, enforcing the `array_length ≤ max_collection_size`
    /// gate on whether `array_elements` is actually populated.
    pub fn with_array_elements(
        mut self,
        array_length: usize,
        elements: Vec<CapturedValue>,
        max_collection_size: usize,
    ) -> Self {
        self.array_length = Some(array_length);
        if array_length <= max_collection_size {
            self.array_elements = Some(elements);
        }
        self
    }
}

/// Truncate a string to `max_len` bytes on a UTF-8 boundary, reporting
/// whether truncation occurred.
fn truncate(value: String, max_len: usize) -> (String, bool) {
    if value.len() <= max_len {
        return (value, false);
    }
    let mut cut = max_len;
    while cut > 0 && !value.is_char_boundary(cut) {
        cut -= 1;
    }
    (value[..cut].to_owned(), true)
}

/// One frame of a captured stack trace (§3 StackFrame).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    pub method_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// 1-indexed, host-visible line number.
    pub line_number: u32,
    pub column_number: u32,
    pub is_native: bool,
    pub source_available: bool,
}

impl StackFrame {
    pub const ANONYMOUS: &'static str = "<anonymous>";

    pub fn anonymous() -> Self {
        Self {
            method_name: Self::ANONYMOUS.to_owned(),
            class_name: None,
            file_name: None,
            file_path: None,
            line_number: 0,
            column_number: 0,
            is_native: false,
            source_available: true,
        }
    }
}

/// An immutable, fully-assembled exception capture (§3 ExceptionCapture).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionCapture {
    pub id: String,
    pub exception_type: String,
    pub message: String,
    pub fingerprint: String,
    /// Up to 50 frames, most-recent first.
    pub stack_trace: Vec<StackFrame>,
    /// Keyed `frame{N}.name` for N>=1, bare `name` for frame 0.
    pub local_variables: BTreeMap<String, CapturedValue>,
    pub context: serde_json::Value,
    pub captured_at: u128,
}

pub const MAX_STACK_FRAMES: usize = 50;

/// A remotely-installed breakpoint (§3 Breakpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub backend_id: String,
    /// Populated only after the debugger acknowledges installation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub file_path_pattern: String,
    /// 1-indexed in the public surface.
    pub line_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Breakpoint {
    /// Translate the 1-indexed public line number to the 0-indexed wire
    /// representation the debugger protocol expects.
    pub fn zero_indexed_line(&self) -> u32 {
        self.line_number.saturating_sub(1)
    }
}

/// The collector wire envelope (§6): `{type, payload, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
    pub timestamp: u128,
}

impl Message {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value, timestamp: u128) -> Self {
        Self { kind: kind.into(), payload, timestamp }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
