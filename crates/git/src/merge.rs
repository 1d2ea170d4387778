// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The serialized rebase + fast-forward + push pipeline (spec.md §4.2
//! `MergeAgentBranch`, `RebaseWorktreeOnMain`).

use crate::error::GitError;
use crate::project::Project;
use crate::run::{run_git, run_git_checked, DEFAULT_GIT_TIMEOUT, GIT_WORKTREE_TIMEOUT};

/// Outcome of [`merge_agent_branch`]. A rebase conflict is a *recoverable*
/// result (`merged = false` with the rebase output in `error`), not an
/// `Err` — the agent keeps its claims and is expected to resolve and
/// re-signal done (spec.md §4.2 "Failure semantics").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub merged: bool,
    pub branch: String,
    pub sha: Option<String>,
    pub error: Option<String>,
}

impl MergeResult {
    fn conflict(branch: String, error: String) -> Self {
        Self { merged: false, branch, sha: None, error: Some(error) }
    }

    fn success(branch: String, sha: String) -> Self {
        Self { merged: true, branch, sha: Some(sha), error: None }
    }
}

/// Integrate a finished agent's branch into `main` (spec.md §4.2, the
/// central merge pipeline). Must be called while holding the project's
/// merge lock — see [`Project::merge_agent_branch`].
async fn merge_agent_branch_locked(project: &Project, agent_id: &str) -> Result<MergeResult, GitError> {
    let worktree = project
        .worktree_for_agent(agent_id)
        .ok_or_else(|| GitError::WorktreeNotFound { agent_id: agent_id.to_string() })?;
    let branch = worktree.branch_name();
    let repo_dir = project.config.repo_dir();

    run_git_checked(&repo_dir, &["fetch", "origin"], DEFAULT_GIT_TIMEOUT).await?;

    let rebase = run_git(&worktree.path, &["rebase", "origin/main"], DEFAULT_GIT_TIMEOUT).await?;
    if !rebase.status.success() {
        let _ = run_git(&worktree.path, &["rebase", "--abort"], DEFAULT_GIT_TIMEOUT).await;
        let output = String::from_utf8_lossy(&rebase.stderr).trim().to_string();
        return Ok(MergeResult::conflict(branch, output));
    }

    let head = run_git_checked(&worktree.path, &["rev-parse", "HEAD"], DEFAULT_GIT_TIMEOUT).await?;
    let sha = String::from_utf8_lossy(&head.stdout).trim().to_string();

    run_git_checked(&repo_dir, &["merge", "--ff-only", &branch], DEFAULT_GIT_TIMEOUT).await?;

    let push = run_git(&repo_dir, &["push", "origin", "main"], DEFAULT_GIT_TIMEOUT).await?;
    if !push.status.success() {
        // Rollback: hard-reset local main to origin/main (spec.md §4.2 step 6).
        let _ = run_git(&repo_dir, &["reset", "--hard", "origin/main"], DEFAULT_GIT_TIMEOUT).await;
        return Err(GitError::CommandFailed {
            command: "push origin main".to_string(),
            stderr: String::from_utf8_lossy(&push.stderr).trim().to_string(),
        });
    }

    Ok(MergeResult::success(branch, sha))
}

/// Bring a worktree up to date with fresh `main` after a failed merge
/// (spec.md §4.2 `RebaseWorktreeOnMain`). Aborts on conflict, returning
/// the rebase output as the error rather than leaving the worktree
/// mid-rebase.
pub async fn rebase_worktree_on_main(project: &Project, agent_id: &str) -> Result<(), GitError> {
    let worktree = project
        .worktree_for_agent(agent_id)
        .ok_or_else(|| GitError::WorktreeNotFound { agent_id: agent_id.to_string() })?;

    run_git_checked(&worktree.path, &["fetch", "origin"], GIT_WORKTREE_TIMEOUT).await?;
    let rebase = run_git(&worktree.path, &["rebase", "origin/main"], DEFAULT_GIT_TIMEOUT).await?;
    if !rebase.status.success() {
        let _ = run_git(&worktree.path, &["rebase", "--abort"], DEFAULT_GIT_TIMEOUT).await;
        return Err(GitError::CommandFailed {
            command: "rebase origin/main".to_string(),
            stderr: String::from_utf8_lossy(&rebase.stderr).trim().to_string(),
        });
    }
    Ok(())
}

impl Project {
    /// Run [`merge_agent_branch_locked`] while holding the project's merge
    /// mutex, serializing this against every other merge on the project
    /// (spec.md §3 invariant (vi)).
    pub async fn merge_agent_branch(&self, agent_id: &str) -> Result<MergeResult, GitError> {
        let _guard = self.merge_lock.lock().await;
        merge_agent_branch_locked(self, agent_id).await
    }

    pub async fn rebase_worktree_on_main(&self, agent_id: &str) -> Result<(), GitError> {
        rebase_worktree_on_main(self, agent_id).await
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
