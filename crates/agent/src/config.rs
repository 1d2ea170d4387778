// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Configuration for starting a process and its read loop (spec.md §4.1
//! `Start`, `StartReadLoop`).

use std::collections::HashMap;
use std::path::PathBuf;

/// How to spawn the assistant CLI for one agent.
#[derive(Debug, Clone)]
pub struct StartConfig {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

impl StartConfig {
    pub fn new(command: impl Into<String>, cwd: PathBuf) -> Self {
        Self { command: command.into(), args: Vec::new(), cwd, env: HashMap::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// How the read loop scans for done-patterns (spec.md §4.1: "configurable
/// number of lines, default 5").
#[derive(Debug, Clone, Copy)]
pub struct ReadLoopConfig {
    pub done_scan_lines: usize,
}

impl Default for ReadLoopConfig {
    fn default() -> Self {
        Self { done_scan_lines: 5 }
    }
}
