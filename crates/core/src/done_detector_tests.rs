// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;

#[yare::parameterized(
    bd_close = { "bd close" },
    bd_close_with_arg = { "bd close fab-42" },
    bd_close_upper = { "BD CLOSE fab-42" },
    beads_close = { "please run /beads:close now" },
    task_completed = { "the task completed successfully" },
    issue_closed = { "issue closed" },
    marked_as_completed = { "this item was marked as completed" },
)]
fn default_patterns_match(line: &str) {
    let detector = DoneDetector::new();
    assert!(detector.check_line(line).is_some(), "expected match for {line:?}");
}

#[test]
fn unrelated_output_does_not_match() {
    let detector = DoneDetector::new();
    assert!(detector.check_line("compiling widgets v0.1.0").is_none());
}

#[test]
fn check_recent_only_scans_the_last_n_lines() {
    let detector = DoneDetector::new();
    let lines: Vec<String> = vec![
        "task completed".to_string(),
        "unrelated 1".to_string(),
        "unrelated 2".to_string(),
    ];
    assert!(detector.check_recent(&lines, 2).is_none());
    assert!(detector.check_recent(&lines, 3).is_some());
}

#[test]
fn check_recent_handles_windows_larger_than_the_buffer() {
    let detector = DoneDetector::new();
    let lines: Vec<String> = vec!["task completed".to_string()];
    assert!(detector.check_recent(&lines, 5).is_some());
}

#[test]
fn custom_patterns_replace_the_defaults() {
    let detector = DoneDetector::with_patterns(vec!["ship it".to_string()]).unwrap();
    assert!(detector.check_line("ok, ship it").is_some());
    assert!(detector.check_line("task completed").is_none());
}

#[test]
fn invalid_pattern_is_rejected() {
    assert!(DoneDetector::with_patterns(vec!["(unclosed".to_string()]).is_err());
}
