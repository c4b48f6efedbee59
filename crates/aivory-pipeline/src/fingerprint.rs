// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The capture content fingerprint (§4.E step 5, §8 property 8) — distinct
//! from the debugger-session dedup key in `aivory_core::keys`, which only
//! suppresses a double report between the two capture paths.

use aivory_core::StackFrame;
use sha2::{Digest, Sha256};

const FINGERPRINT_HEX_LEN: usize = 16;
const MAX_FRAMES_IN_FINGERPRINT: usize = 5;

/// SHA-256 (first 16 hex chars) of `exception_type` joined with up to five
/// `method:line` entries taken from the first non-native frames.
pub fn content_fingerprint(exception_type: &str, frames: &[StackFrame]) -> String {
    let mut input = exception_type.to_owned();
    for frame in frames.iter().filter(|f| !f.is_native).take(MAX_FRAMES_IN_FINGERPRINT) {
        input.push('|');
        input.push_str(&frame.method_name);
        input.push(':');
        input.push_str(&frame.line_number.to_string());
    }
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect::<String>()[..FINGERPRINT_HEX_LEN].to_owned()
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
