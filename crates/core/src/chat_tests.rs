// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;

#[test]
fn push_appends_in_order() {
    let history = ChatHistory::new(10);
    history.push(ChatEntry::new(ChatRole::User, "hi", 1));
    history.push(ChatEntry::new(ChatRole::Assistant, "hello", 2));
    let entries = history.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].role, ChatRole::User);
    assert_eq!(entries[1].text, "hello");
}

#[test]
fn overflow_evicts_oldest_entry() {
    let history = ChatHistory::new(2);
    history.push(ChatEntry::new(ChatRole::User, "one", 1));
    history.push(ChatEntry::new(ChatRole::User, "two", 2));
    history.push(ChatEntry::new(ChatRole::User, "three", 3));
    let entries = history.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "two");
    assert_eq!(entries[1].text, "three");
}

#[test]
fn total_pushed_counts_evicted_entries_too() {
    let history = ChatHistory::new(1);
    for i in 0..5 {
        history.push(ChatEntry::new(ChatRole::Tool, format!("entry{i}"), i));
    }
    assert_eq!(history.total_pushed(), 5);
    assert_eq!(history.len(), 1);
}

#[test]
fn role_display_is_lowercase() {
    assert_eq!(ChatRole::User.to_string(), "user");
    assert_eq!(ChatRole::Assistant.to_string(), "assistant");
    assert_eq!(ChatRole::Tool.to_string(), "tool");
}
