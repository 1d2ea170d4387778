// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;
use crate::test_support::init_project_fixture;
use fab_core::ProjectConfig;
use tempfile::tempdir;
use tokio::process::Command;

async fn git(cwd: &std::path::Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .await
        .expect("spawn git");
    assert!(output.status.success(), "git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
}

async fn fixture_project() -> (tempfile::TempDir, Project) {
    let tmp = tempdir().expect("tempdir");
    let project_dir = tmp.path().join("proj");
    tokio::fs::create_dir_all(&project_dir).await.expect("create project dir");
    init_project_fixture(&project_dir).await;
    let config = ProjectConfig::new("proj", "unused", tmp.path().to_path_buf());
    (tmp, Project::new(config))
}

#[tokio::test]
async fn merge_agent_branch_fast_forwards_main_and_pushes() {
    let (_tmp, project) = fixture_project().await;
    let worktree = project.create_worktree_for_agent("abc123").await.unwrap();

    tokio::fs::write(worktree.path.join("feature.txt"), b"new feature\n").await.unwrap();
    git(&worktree.path, &["add", "feature.txt"]).await;
    git(&worktree.path, &["commit", "-q", "-m", "add feature"]).await;

    let result = project.merge_agent_branch("abc123").await.unwrap();
    assert!(result.merged);
    assert_eq!(result.branch, "fab/abc123");
    assert!(result.sha.is_some());

    let log = run_git_checked(
        &project.config.repo_dir(),
        &["log", "--oneline", "-1", "main"],
        DEFAULT_GIT_TIMEOUT,
    )
    .await
    .unwrap();
    assert!(String::from_utf8_lossy(&log.stdout).contains("add feature"));
}

#[tokio::test]
async fn merge_agent_branch_for_unknown_agent_errors() {
    let (_tmp, project) = fixture_project().await;
    let err = project.merge_agent_branch("ghost").await.unwrap_err();
    assert!(matches!(err, GitError::WorktreeNotFound { .. }));
}

#[tokio::test]
async fn merge_agent_branch_reports_conflict_without_erroring() {
    let (_tmp, project) = fixture_project().await;
    let worktree = project.create_worktree_for_agent("abc123").await.unwrap();

    // Conflicting edit on the agent's branch.
    tokio::fs::write(worktree.path.join("README.md"), b"agent change\n").await.unwrap();
    git(&worktree.path, &["add", "README.md"]).await;
    git(&worktree.path, &["commit", "-q", "-m", "agent edits readme"]).await;

    // A conflicting edit lands on mainline from outside the fleet.
    let repo_dir = project.config.repo_dir();
    tokio::fs::write(repo_dir.join("README.md"), b"mainline change\n").await.unwrap();
    git(&repo_dir, &["add", "README.md"]).await;
    git(&repo_dir, &["commit", "-q", "-m", "mainline edits readme"]).await;
    git(&repo_dir, &["push", "-q", "origin", "main"]).await;

    let result = project.merge_agent_branch("abc123").await.unwrap();
    assert!(!result.merged);
    assert!(result.error.is_some());
    assert!(result.sha.is_none());

    // The worktree's branch is left intact, not mid-rebase.
    let status = run_git_checked(&worktree.path, &["status", "--porcelain=v1"], DEFAULT_GIT_TIMEOUT)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&status.stdout).is_empty());
}

#[tokio::test]
async fn rebase_worktree_on_main_picks_up_fresh_mainline() {
    let (_tmp, project) = fixture_project().await;
    let worktree = project.create_worktree_for_agent("abc123").await.unwrap();

    let repo_dir = project.config.repo_dir();
    tokio::fs::write(repo_dir.join("upstream.txt"), b"from mainline\n").await.unwrap();
    git(&repo_dir, &["add", "upstream.txt"]).await;
    git(&repo_dir, &["commit", "-q", "-m", "mainline progress"]).await;
    git(&repo_dir, &["push", "-q", "origin", "main"]).await;

    project.rebase_worktree_on_main("abc123").await.unwrap();
    assert!(worktree.path.join("upstream.txt").exists());
}
