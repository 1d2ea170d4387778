// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Bounded, thread-safe, line-oriented output log (spec.md §3, §8).
//!
//! Bytes are fed in as they arrive from a child process's stdout. Complete
//! lines are pushed onto a fixed-capacity ring; a trailing partial line (no
//! `\n` yet) is held separately until either a newline arrives or the
//! caller calls [`RingBuffer::flush`].

use parking_lot::Mutex;
use std::collections::VecDeque;

struct Inner {
    capacity: usize,
    lines: VecDeque<String>,
    partial: String,
}

/// Thread-safe ring buffer of the last `capacity` output lines.
pub struct RingBuffer {
    inner: Mutex<Inner>,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                lines: VecDeque::with_capacity(capacity.max(1)),
                partial: String::new(),
            }),
        }
    }

    /// Append raw bytes, splitting on `\n`. Lossy-decodes non-UTF-8 bytes
    /// (child process output is not guaranteed to be valid UTF-8).
    pub fn write(&self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let mut inner = self.inner.lock();
        let mut chunks = text.split('\n').peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_none() {
                // Last chunk: no trailing newline was present in `text`, so
                // this is a (possibly empty) partial line. Append, don't push.
                inner.partial.push_str(chunk);
            } else {
                let mut line = std::mem::take(&mut inner.partial);
                line.push_str(chunk);
                push_bounded(&mut inner.lines, inner.capacity, line);
            }
        }
    }

    /// Materialize the current partial line as a complete line, clearing it.
    /// No-op if there is no pending partial line.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        if !inner.partial.is_empty() {
            let line = std::mem::take(&mut inner.partial);
            let cap = inner.capacity;
            push_bounded(&mut inner.lines, cap, line);
        }
    }

    /// All currently retained complete lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines.iter().cloned().collect()
    }

    /// The last `n` retained complete lines, oldest first (cheap incremental
    /// check for the done detector, spec.md §4.1).
    pub fn last_lines(&self, n: usize) -> Vec<String> {
        let inner = self.inner.lock();
        let skip = inner.lines.len().saturating_sub(n);
        inner.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

fn push_bounded(lines: &mut VecDeque<String>, capacity: usize, line: String) {
    if lines.len() >= capacity {
        lines.pop_front();
    }
    lines.push_back(line);
}

#[cfg(test)]
#[path = "ring_buffer_tests.rs"]
mod tests;
