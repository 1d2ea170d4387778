// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Error taxonomy for the worktree & merge engine (spec.md §7
//! "Git integration errors").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("project already has the maximum number of worktrees")]
    NoWorktreeAvailable,

    #[error("no worktree registered for agent {agent_id}")]
    WorktreeNotFound { agent_id: String },

    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("`git {command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("io error running git: {0}")]
    Io(#[from] std::io::Error),
}
