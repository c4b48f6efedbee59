// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Bounded outbound message queue (§4.B, §8 properties 4-5).
//!
//! FIFO on enqueue and drain; when full, the oldest message is head-evicted
//! to make room for the newest, favouring recent telemetry over old per §5.

use std::collections::VecDeque;

use aivory_core::Message;

pub const DEFAULT_CAPACITY: usize = 100;

/// A bounded, ordered outbound buffer.
pub struct OutboundQueue {
    capacity: usize,
    items: VecDeque<Message>,
    dropped: u64,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, items: VecDeque::with_capacity(capacity), dropped: 0 }
    }

    /// Enqueue a message, head-evicting the oldest entry if at capacity.
    pub fn push(&mut self, message: Message) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
            self.dropped += 1;
            tracing::debug!(dropped_total = self.dropped, "outbound queue full, dropped oldest message");
        }
        self.items.push_back(message);
    }

    /// Remove and return every queued message in FIFO order.
    pub fn drain(&mut self) -> Vec<Message> {
        self.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
