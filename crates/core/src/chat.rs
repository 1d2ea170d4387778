// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Bounded circular log of parsed chat entries (spec.md §3 "Chat history").
//!
//! Entries are produced by the read loop as it parses the assistant's
//! stdout stream (see [`crate::stream`]) into human-readable turns.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Who produced a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    Tool,
}

crate::simple_display! {
    ChatRole {
        User => "user",
        Assistant => "assistant",
        Tool => "tool",
    }
}

/// One parsed turn in an agent's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
    pub timestamp_ms: u64,
}

impl ChatEntry {
    pub fn new(role: ChatRole, text: impl Into<String>, timestamp_ms: u64) -> Self {
        Self { role, text: text.into(), timestamp_ms }
    }
}

/// Thread-safe bounded ring of [`ChatEntry`] values.
///
/// Shares the eviction policy with [`crate::ring_buffer::RingBuffer`]
/// (spec.md §5 "Bounded-buffer overflow semantics"): oldest entry dropped
/// on overflow.
pub struct ChatHistory {
    capacity: usize,
    entries: Mutex<VecDeque<ChatEntry>>,
    next_seq: AtomicU64,
}

impl ChatHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn push(&self, entry: ChatEntry) {
        self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of entries ever pushed, including ones since evicted.
    pub fn total_pushed(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
