// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Reconnect backoff schedule (§4.B, §8 property 6).

use std::time::Duration;

const BASE_MS: u64 = 1_000;
const MAX_MS: u64 = 60_000;
pub const MAX_ATTEMPTS: u32 = 10;

/// `delay(attempt) = min(base * 2^(attempt-1), 60s)` for `attempt >= 1`.
pub fn delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let shift = attempt.saturating_sub(1).min(63);
    let scaled = BASE_MS.saturating_mul(1u64 << shift);
    Duration::from_millis(scaled.min(MAX_MS))
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
