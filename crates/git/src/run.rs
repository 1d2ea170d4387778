// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Timeout-wrapped `git` subprocess runner.
//!
//! Grounded on the teacher's `create_worktree` shape (build args, run with
//! a timeout, inspect `status.success()`) reconstructed as a small shared
//! helper since every worktree/merge operation shells out the same way.

use crate::error::GitError;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default ceiling for any single git subprocess (fetch, rebase, push, ...).
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(60);
/// Worktree add/remove can be slower on large repos.
pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(120);

/// Run `git <args>` in `cwd` with a timeout, returning the raw [`Output`]
/// regardless of exit status (callers decide what a nonzero status means).
pub async fn run_git(cwd: &Path, args: &[&str], timeout: Duration) -> Result<Output, GitError> {
    let command_label = args.join(" ");
    let mut cmd = Command::new("git");
    cmd.current_dir(cwd)
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| GitError::Timeout { command: command_label.clone(), timeout_secs: timeout.as_secs() })??;

    tracing::debug!(command = %command_label, status = ?output.status, "ran git");
    Ok(output)
}

/// Run `git <args>` and turn a nonzero exit into [`GitError::CommandFailed`].
pub async fn run_git_checked(cwd: &Path, args: &[&str], timeout: Duration) -> Result<Output, GitError> {
    let output = run_git(cwd, args, timeout).await?;
    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
