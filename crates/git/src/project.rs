// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Live project state: worktree list plus the locks that guard it
//! (spec.md §3 "Project", §5 "Shared-resource policy").

use crate::error::GitError;
use crate::run::{run_git, run_git_checked, GIT_WORKTREE_TIMEOUT};
use fab_core::{ProjectConfig, Worktree};
use parking_lot::RwLock;
use std::path::Path;

/// A project's live git state: its config plus the worktree list and the
/// two locks spec.md §3 calls for.
///
/// The worktree list lock is `parking_lot::RwLock` (never held across an
/// `.await` — spec.md §5 lock-ordering rule: "never hold the project lock
/// across a git subprocess call"). The merge lock is `tokio::sync::Mutex`
/// because it *must* be held across the whole rebase+ff+push sequence
/// (spec.md §3 invariant (vi): "at most one rebase+push is in flight per
/// project").
pub struct Project {
    pub config: ProjectConfig,
    worktrees: RwLock<Vec<Worktree>>,
    pub(crate) merge_lock: tokio::sync::Mutex<()>,
}

impl Project {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config, worktrees: RwLock::new(Vec::new()), merge_lock: tokio::sync::Mutex::new(()) }
    }

    pub fn worktree_count(&self) -> usize {
        self.worktrees.read().len()
    }

    pub fn worktree_for_agent(&self, agent_id: &str) -> Option<Worktree> {
        self.worktrees.read().iter().find(|w| w.agent_id.as_str() == agent_id).cloned()
    }

    /// Create a dedicated worktree for a freshly allocated agent id
    /// (spec.md §4.2 `CreateWorktreeForAgent`).
    pub async fn create_worktree_for_agent(&self, agent_id: &str) -> Result<Worktree, GitError> {
        {
            let worktrees = self.worktrees.read();
            if worktrees.len() as u32 >= self.config.max_agents {
                return Err(GitError::NoWorktreeAvailable);
            }
        }

        let repo_dir = self.config.repo_dir();
        let path = self.config.worktree_path(agent_id);
        let branch = format!("fab/{agent_id}");
        let path_str = path.display().to_string();

        run_git_checked(
            &repo_dir,
            &["worktree", "add", "--detach", &path_str],
            GIT_WORKTREE_TIMEOUT,
        )
        .await?;

        run_git_checked(&path, &["fetch", "origin"], GIT_WORKTREE_TIMEOUT).await?;
        run_git_checked(&path, &["reset", "--hard", "origin/main"], GIT_WORKTREE_TIMEOUT).await?;
        run_git_checked(&path, &["clean", "-fdx"], GIT_WORKTREE_TIMEOUT).await?;
        run_git_checked(&path, &["checkout", "-b", &branch], GIT_WORKTREE_TIMEOUT).await?;

        let worktree = Worktree::new(path, fab_core::AgentId::from(agent_id));
        self.worktrees.write().push(worktree.clone());
        Ok(worktree)
    }

    /// Remove an agent's worktree (spec.md §4.2 `DeleteWorktreeForAgent`).
    /// Removes the bookkeeping record under lock, then runs the git cleanup
    /// outside the lock.
    pub async fn delete_worktree_for_agent(&self, agent_id: &str) -> Result<(), GitError> {
        let removed = {
            let mut worktrees = self.worktrees.write();
            let pos = worktrees.iter().position(|w| w.agent_id.as_str() == agent_id);
            pos.map(|i| worktrees.remove(i))
        };
        let Some(worktree) = removed else {
            return Err(GitError::WorktreeNotFound { agent_id: agent_id.to_string() });
        };

        let repo_dir = self.config.repo_dir();
        let path_str = worktree.path.display().to_string();
        let result =
            run_git_checked(&repo_dir, &["worktree", "remove", "--force", &path_str], GIT_WORKTREE_TIMEOUT)
                .await;
        if result.is_err() && worktree.path.exists() {
            remove_dir_best_effort(&worktree.path).await;
        }
        let _ = run_git(&repo_dir, &["worktree", "prune"], GIT_WORKTREE_TIMEOUT).await;
        Ok(())
    }
}

async fn remove_dir_best_effort(path: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(path).await {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove worktree directory");
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
