// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Project configuration (spec.md §3 "Project").
//!
//! `ProjectConfig` is plain data — the live object with its worktree list,
//! general lock, and merge mutex is `fab_git::Project`, which embeds one of
//! these. Keeping the config here lets it be loaded, validated, and unit
//! tested without pulling in `tokio` or touching a filesystem.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default cap on concurrent agents for a project that doesn't override it.
pub const DEFAULT_MAX_AGENTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Unique key across the daemon's project set.
    pub name: String,
    pub remote_url: String,
    #[serde(default = "default_max_agents")]
    pub max_agents: u32,
    /// Selector naming which `IssueBackend` implementation to construct
    /// for this project (the core only consumes the `IssueBackend` trait;
    /// resolving a selector string to an implementation is a `fab-daemon`
    /// concern per spec.md §1's "only the interface is specified").
    pub issue_backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_authors: Option<Vec<String>>,
    #[serde(default)]
    pub autostart: bool,
    /// Selector naming which permission-checker implementation gates
    /// actions for this project (contract only, per spec.md §1).
    #[serde(default)]
    pub permission_checker: String,
    pub base_dir: PathBuf,
}

fn default_max_agents() -> u32 {
    DEFAULT_MAX_AGENTS
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, remote_url: impl Into<String>, base_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            remote_url: remote_url.into(),
            max_agents: DEFAULT_MAX_AGENTS,
            issue_backend: String::new(),
            allowed_authors: None,
            autostart: false,
            permission_checker: String::new(),
            base_dir,
        }
    }

    /// `<base>/<name>/` (spec.md §4.2 "Directory contract").
    pub fn project_dir(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }

    /// `<base>/<name>/repo` — the private clone tracking `origin/main`.
    pub fn repo_dir(&self) -> PathBuf {
        self.project_dir().join("repo")
    }

    /// `<base>/<name>/worktrees`.
    pub fn worktrees_dir(&self) -> PathBuf {
        self.project_dir().join("worktrees")
    }

    /// `<base>/<name>/worktrees/wt-<agentID>`.
    pub fn worktree_path(&self, agent_id: &str) -> PathBuf {
        self.worktrees_dir().join(format!("wt-{agent_id}"))
    }

    /// Is an author on the allowlist? Absent list means "allow everyone".
    pub fn author_allowed(&self, author: &str) -> bool {
        match &self.allowed_authors {
            None => true,
            Some(list) => list.iter().any(|a| a == author),
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
