// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The two correlation keys shared between the debugger-pause path and the
//! exception-hook path (§4.C, §4.E, §8 property 7). Living in one place
//! guarantees both sides compute the same thing instead of reimplementing
//! the grammar twice and hoping they agree.

/// The **stack key**: first four lines of a stack/description string,
/// joined by `|`. Falls back to a time-based key when there is no text to
/// key on, so a harvest is still cacheable under *something*.
pub fn stack_key(description: &str, now_ms: u128) -> String {
    let lines: Vec<&str> = description.lines().take(4).collect();
    if lines.is_empty() {
        format!("unknown-{now_ms}")
    } else {
        lines.join("|")
    }
}

/// The **dedup fingerprint**: `exception_type + "|" + first 3 top-frame
/// line numbers`, used only to suppress a double report between the
/// debugger path and the exception-hook path.
pub fn dedup_fingerprint(exception_type: &str, top_frame_lines: &[u32]) -> String {
    let lines: Vec<String> = top_frame_lines.iter().take(3).map(u32::to_string).collect();
    format!("{exception_type}|{}", lines.join("|"))
}

#[cfg(test)]
#[path = "keys_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
