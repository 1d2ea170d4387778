// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;

fn record(sha: &str) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        branch: "fab/abc123".to_string(),
        agent_id: "abc123".to_string(),
        task_id: "t1".to_string(),
        description: "do the thing".to_string(),
        merged_at_ms: 1,
    }
}

#[test]
fn default_capacity_matches_spec() {
    assert_eq!(CommitLog::default().capacity, DEFAULT_CAPACITY);
}

#[test]
fn recent_returns_newest_first() {
    let log = CommitLog::new(10);
    log.record(record("sha1"));
    log.record(record("sha2"));
    log.record(record("sha3"));
    let shas: Vec<_> = log.recent().into_iter().map(|r| r.sha).collect();
    assert_eq!(shas, vec!["sha3", "sha2", "sha1"]);
}

#[test]
fn overflow_evicts_oldest() {
    let log = CommitLog::new(2);
    log.record(record("sha1"));
    log.record(record("sha2"));
    log.record(record("sha3"));
    let shas: Vec<_> = log.recent().into_iter().map(|r| r.sha).collect();
    assert_eq!(shas, vec!["sha3", "sha2"]);
    assert_eq!(log.len(), 2);
}
