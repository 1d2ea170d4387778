// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Per-agent bounded history of [`StreamEvent`]s with offset-based replay
//! (spec.md §3 "Stream event", §4.4 "Stream event envelope"/"Attach
//! semantics").
//!
//! Offsets start at 1 and increase by 1 per event (spec.md invariant (v)).
//! The ring itself assigns offsets so callers never race on the counter.

use fab_core::StreamEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default retained window (spec.md §4.4: "buffered in a per-server ring
/// (default 1000)").
pub const DEFAULT_EVENT_RING_CAPACITY: usize = 1000;

struct Inner {
    capacity: usize,
    events: VecDeque<StreamEvent>,
    next_offset: u64,
}

pub struct EventRing {
    inner: Mutex<Inner>,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                events: VecDeque::with_capacity(capacity.max(1)),
                next_offset: 0,
            }),
        }
    }

    /// Assign the next offset, build the event via `make`, store it (evicting
    /// the oldest on overflow), and return a clone for broadcast.
    pub fn push(&self, make: impl FnOnce(u64) -> StreamEvent) -> StreamEvent {
        let mut inner = self.inner.lock();
        inner.next_offset += 1;
        let offset = inner.next_offset;
        let event = make(offset);
        if inner.events.len() >= inner.capacity {
            inner.events.pop_front();
        }
        inner.events.push_back(event.clone());
        event
    }

    /// The most recently assigned offset, 0 if no events yet.
    pub fn current_offset(&self) -> u64 {
        self.inner.lock().next_offset
    }

    /// All retained events with `offset > requested`, in increasing-offset
    /// order, plus whether the requested offset fell outside the retained
    /// window (spec.md §9 open question, resolved additively — see
    /// [`crate::response::AttachPayload::truncated`]).
    pub fn replay_since(&self, requested: u64) -> (Vec<StreamEvent>, bool) {
        let inner = self.inner.lock();
        // Offset of the oldest event still retained; if nothing has been
        // pushed yet, treat it as 1 so an empty ring never reports truncation.
        let oldest_retained = inner.events.front().map(|e| e.offset).unwrap_or(1);
        let truncated = requested + 1 < oldest_retained;
        let events = inner.events.iter().filter(|e| e.offset > requested).cloned().collect();
        (events, truncated)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "event_ring_tests.rs"]
mod tests;
