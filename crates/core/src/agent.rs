// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Agent identifier, state machine, mode, and the pure state/process error
//! taxonomy (spec.md §7 "State errors").
//!
//! This module is pure: it knows nothing about processes, sockets, or git.
//! `fab-agent::Agent` embeds `AgentState` and drives it through the
//! transition table below; `fab-daemon` never constructs states directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent: 6 lowercase hex characters (spec.md §3, §4.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a fresh, randomly chosen agent id.
    pub fn new() -> Self {
        Self(crate::id::new_short_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Branch name this agent's worktree is checked out on: `fab/<id>`.
    pub fn branch_name(&self) -> String {
        format!("fab/{}", self.0)
    }

    /// Worktree directory name: `wt-<id>`.
    pub fn worktree_name(&self) -> String {
        format!("wt-{}", self.0)
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Whether a freshly started agent is driven automatically or waits for a
/// human to stage/approve each action (spec.md §3, §9 "Mode variants").
///
/// A sum type rather than a `bool` so a future `DryRun` variant doesn't
/// require renaming the existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Manual,
    Auto,
}

crate::simple_display! {
    AgentMode {
        Manual => "manual",
        Auto => "auto",
    }
}

/// State of an agent's lifecycle (spec.md §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Starting,
    Running,
    Idle,
    Done,
    Error,
}

crate::simple_display! {
    AgentState {
        Starting => "starting",
        Running => "running",
        Idle => "idle",
        Done => "done",
        Error => "error",
    }
}

impl AgentState {
    /// True for `Starting`, `Running`, `Idle` — the agent is doing or about
    /// to do work and has not reached a terminal outcome.
    pub fn is_active(self) -> bool {
        matches!(self, AgentState::Starting | AgentState::Running | AgentState::Idle)
    }

    /// True for `Done`, `Error` — the agent will not progress without a
    /// `Reset`.
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Done | AgentState::Error)
    }

    /// Whether the transition `self -> target` is permitted by the table in
    /// spec.md §4.1.
    pub fn can_transition_to(self, target: AgentState) -> bool {
        use AgentState::*;
        matches!(
            (self, target),
            (Starting, Running)
                | (Starting, Error)
                | (Running, Idle)
                | (Running, Done)
                | (Running, Error)
                | (Idle, Running)
                | (Idle, Done)
                | (Idle, Error)
                | (Done, Starting)
                | (Error, Starting)
        )
    }

    /// Attempt the transition, returning the new state or `InvalidTransition`.
    /// Does not mutate `self` — callers hold the authoritative state behind
    /// a lock and assign the result themselves.
    pub fn transition(self, target: AgentState) -> Result<AgentState, AgentError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(AgentError::InvalidTransition { from: self, to: target })
        }
    }
}

/// Pure state/process error taxonomy (spec.md §7 "State errors").
///
/// I/O-flavored errors (spawn failure, stdin write failure, stdout read
/// failure) live in `fab_agent::AgentRuntimeError`, which wraps this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: AgentState, to: AgentState },

    #[error("process already started")]
    ProcessAlreadyStarted,

    #[error("process not started")]
    ProcessNotStarted,

    #[error("read loop already running")]
    ReadLoopAlreadyRunning,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
