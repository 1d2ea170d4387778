// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;
use fab_core::StreamEvent;

fn output_event(offset: u64) -> StreamEvent {
    StreamEvent::output("a1", offset, "t".to_string(), format!("line-{offset}"))
}

#[test]
fn offsets_start_at_one_and_increase_by_one() {
    let ring = EventRing::new(10);
    let first = ring.push(|offset| output_event(offset));
    let second = ring.push(|offset| output_event(offset));
    assert_eq!(first.offset, 1);
    assert_eq!(second.offset, 2);
}

#[test]
fn replay_since_returns_events_strictly_after_the_requested_offset() {
    let ring = EventRing::new(10);
    for _ in 0..5 {
        ring.push(output_event);
    }
    let (events, truncated) = ring.replay_since(3);
    assert_eq!(events.iter().map(|e| e.offset).collect::<Vec<_>>(), vec![4, 5]);
    assert!(!truncated);
}

#[test]
fn replay_since_zero_returns_everything_still_retained() {
    let ring = EventRing::new(10);
    for _ in 0..3 {
        ring.push(output_event);
    }
    let (events, truncated) = ring.replay_since(0);
    assert_eq!(events.len(), 3);
    assert!(!truncated);
}

#[test]
fn replay_older_than_the_retained_window_is_marked_truncated() {
    let ring = EventRing::new(3);
    for _ in 0..10 {
        ring.push(output_event);
    }
    // offsets 1..7 have been evicted; only 8,9,10 remain.
    let (events, truncated) = ring.replay_since(2);
    assert_eq!(events.iter().map(|e| e.offset).collect::<Vec<_>>(), vec![8, 9, 10]);
    assert!(truncated);
}

#[test]
fn empty_ring_is_never_truncated() {
    let ring = EventRing::new(10);
    let (events, truncated) = ring.replay_since(0);
    assert!(events.is_empty());
    assert!(!truncated);
}

#[test]
fn current_offset_tracks_the_last_assigned_offset() {
    let ring = EventRing::new(10);
    assert_eq!(ring.current_offset(), 0);
    ring.push(output_event);
    ring.push(output_event);
    assert_eq!(ring.current_offset(), 2);
}
