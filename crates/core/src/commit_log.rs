// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Bounded commit log (spec.md §3 "Commit log").
//!
//! Observability-only record of successful merges. Oldest entry is
//! evicted on overflow; reads return newest-first.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use parking_lot::Mutex;

/// Default retained capacity (spec.md §3: "Bounded (default 100)").
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub branch: String,
    pub agent_id: String,
    pub task_id: String,
    pub description: String,
    pub merged_at_ms: u64,
}

/// Thread-safe bounded ring of [`CommitRecord`] values.
pub struct CommitLog {
    capacity: usize,
    records: Mutex<VecDeque<CommitRecord>>,
}

impl CommitLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn record(&self, entry: CommitRecord) {
        let mut records = self.records.lock();
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(entry);
    }

    /// Retained records, newest first.
    pub fn recent(&self) -> Vec<CommitRecord> {
        self.records.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommitLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "commit_log_tests.rs"]
mod tests;
