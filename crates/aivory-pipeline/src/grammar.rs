// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The stack-trace grammar (§4.E step 2): turns a host exception's raw
//! multi-line textual description into `StackFrame` records.
//!
//! Host-specific by design — a different host runtime's stack-trace dialect
//! replaces this module but keeps the resulting `StackFrame` shape (§7
//! Source-language exception shapes).

use std::sync::OnceLock;

use aivory_core::model::{StackFrame, MAX_STACK_FRAMES};
use regex::Regex;

const NATIVE_SENTINEL: &str = "native";
const VENDOR_SEGMENTS: &[&str] = &["/node_modules/", "/vendor/"];
const RUNTIME_INTERNAL_PREFIXES: &[&str] = &["node:", "internal/"];

/// `at fn (file:line:col)` — also matches `at async fn (file:line:col)`,
/// since `async ` is just more text ahead of the parenthesized location.
#[allow(clippy::expect_used)]
fn frame_with_location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^at\s+(?P<func>.+?)\s+\((?P<loc>[^()]+)\)$").expect("static regex is valid"))
}

/// `at file:line:col` — no function name, no parens.
#[allow(clippy::expect_used)]
fn bare_location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^at\s+(?P<loc>[^()]+)$").expect("static regex is valid"))
}

#[allow(clippy::expect_used)]
fn file_line_col_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<file>.+):(?P<line>\d+):(?P<col>\d+)$").expect("static regex is valid")
    })
}

fn source_available(file_path: &str) -> bool {
    if VENDOR_SEGMENTS.iter().any(|seg| file_path.contains(seg)) {
        return false;
    }
    !RUNTIME_INTERNAL_PREFIXES.iter().any(|prefix| file_path.starts_with(prefix))
}

fn frame_for_location(func: Option<&str>, loc: &str) -> StackFrame {
    let method_name =
        func.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(StackFrame::ANONYMOUS).to_owned();

    if loc.trim() == NATIVE_SENTINEL {
        return StackFrame {
            method_name,
            class_name: None,
            file_name: None,
            file_path: None,
            line_number: 0,
            column_number: 0,
            is_native: true,
            source_available: false,
        };
    }

    if let Some(caps) = file_line_col_re().captures(loc) {
        let file_path = caps["file"].to_owned();
        let line_number: u32 = caps["line"].parse().unwrap_or(0);
        let column_number: u32 = caps["col"].parse().unwrap_or(0);
        return StackFrame {
            method_name,
            class_name: None,
            file_name: file_path.rsplit('/').next().map(str::to_owned),
            source_available: source_available(&file_path),
            file_path: Some(file_path),
            line_number,
            column_number,
            is_native: false,
        };
    }

    // Doesn't fit file:line:col either — keep the function name and the raw
    // location text rather than dropping the frame outright.
    StackFrame {
        method_name,
        class_name: None,
        file_name: None,
        file_path: Some(loc.to_owned()),
        line_number: 0,
        column_number: 0,
        is_native: false,
        source_available: false,
    }
}

fn parse_frame(line: &str) -> Option<StackFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(caps) = frame_with_location_re().captures(line) {
        return Some(frame_for_location(Some(&caps["func"]), &caps["loc"]));
    }
    if let Some(caps) = bare_location_re().captures(line) {
        return Some(frame_for_location(None, &caps["loc"]));
    }
    None
}

/// Parse a raw exception's stack text into up to [`MAX_STACK_FRAMES`]
/// frames. The conventional leading `Name: message` line — anything before
/// the first line the grammar recognizes — is dropped.
pub fn parse_stack_trace(stack_text: &str) -> Vec<StackFrame> {
    stack_text
        .lines()
        .skip_while(|line| parse_frame(line).is_none())
        .filter_map(parse_frame)
        .take(MAX_STACK_FRAMES)
        .collect()
}

#[cfg(test)]
#[path = "grammar_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
