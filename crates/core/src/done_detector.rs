// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Regex-pattern matcher over recent output lines (spec.md §3 "Done
//! detector", §6 "Done-pattern defaults").

use regex::{Regex, RegexSet};

/// A matched done-pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the pattern that matched, in construction order.
    pub pattern_index: usize,
    /// The line that matched.
    pub line: String,
}

/// Case-insensitive regex matcher checked against recent agent output.
pub struct DoneDetector {
    set: RegexSet,
    patterns: Vec<Regex>,
}

impl DoneDetector {
    /// Spec.md §6 default patterns: `bd close`, `/beads:close`, and the
    /// task/issue-completion phrases.
    pub fn default_patterns() -> Vec<String> {
        vec![
            r"bd\s+close(?:\s+[\w-]+)?".to_string(),
            r"/beads:close".to_string(),
            r"task\s+completed|issue\s+closed|marked\s+as\s+completed".to_string(),
        ]
    }

    pub fn new() -> Self {
        Self::with_patterns(Self::default_patterns()).expect("default patterns are valid regex")
    }

    /// Build a detector from caller-supplied patterns (all case-insensitive).
    pub fn with_patterns(patterns: Vec<String>) -> Result<Self, regex::Error> {
        let compiled: Result<Vec<Regex>, _> =
            patterns.iter().map(|p| Regex::new(&format!("(?i){p}"))).collect();
        let compiled = compiled?;
        let set = RegexSet::new(patterns.iter().map(|p| format!("(?i){p}")))?;
        Ok(Self { set, patterns: compiled })
    }

    /// Scan a single line, returning the first pattern that matches.
    pub fn check_line(&self, line: &str) -> Option<Match> {
        self.set
            .matches(line)
            .iter()
            .next()
            .map(|idx| Match { pattern_index: idx, line: line.to_string() })
    }

    /// Scan the last `n` lines of recent output (spec.md §4.1
    /// "StartReadLoop" — default `n` is 5), returning the first match found,
    /// scanning oldest to newest within the window.
    pub fn check_recent(&self, lines: &[String], n: usize) -> Option<Match> {
        let skip = lines.len().saturating_sub(n);
        lines[skip..].iter().find_map(|line| self.check_line(line))
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl Default for DoneDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "done_detector_tests.rs"]
mod tests;
