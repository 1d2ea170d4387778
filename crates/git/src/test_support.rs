// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Shared git-repo fixtures for `fab-git`'s own tests.

use std::path::{Path, PathBuf};
use tokio::process::Command;

async fn git(cwd: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .await
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Set up `<base>/origin` as a bare remote and `<base>/repo` as a clone
/// with one commit on `main`. Returns the clone's path.
pub async fn init_project_fixture(base: &Path) -> PathBuf {
    let origin = base.join("origin");
    let repo = base.join("repo");
    tokio::fs::create_dir_all(&origin).await.expect("create origin dir");

    git(&origin, &["init", "--bare", "-q"]).await;
    git(base, &["clone", "-q", origin.to_str().unwrap(), repo.to_str().unwrap()]).await;
    git(&repo, &["config", "user.email", "fab-test@example.com"]).await;
    git(&repo, &["config", "user.name", "fab test"]).await;
    git(&repo, &["checkout", "-b", "main"]).await;
    tokio::fs::write(repo.join("README.md"), b"hello\n").await.expect("write readme");
    git(&repo, &["add", "README.md"]).await;
    git(&repo, &["commit", "-q", "-m", "initial commit"]).await;
    git(&repo, &["push", "-q", "-u", "origin", "main"]).await;

    repo
}
