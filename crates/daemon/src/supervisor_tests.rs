// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;
use crate::orchestrator::OrchestratorConfig;
use fab_core::{FakeClock, IssueBackendError, Issue, ProjectConfig};
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use tokio::process::Command as TokioCommand;

async fn git(cwd: &Path, args: &[&str]) {
    let output = TokioCommand::new("git").args(args).current_dir(cwd).output().await.expect("failed to spawn git");
    assert!(output.status.success(), "git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
}

async fn fixture_project(base: &Path, name: &str, autostart: bool) -> GitProject {
    let origin = base.join(format!("{name}-origin"));
    let repo = base.join(name);
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

    let mut config = ProjectConfig::new(name, "unused", base.to_path_buf());
    config.autostart = autostart;
    config.max_agents = 1;
    GitProject::new(config)
}

struct EmptyIssueBackend;

#[async_trait::async_trait]
impl IssueBackend for EmptyIssueBackend {
    async fn ready(&self) -> Result<Vec<Issue>, IssueBackendError> {
        Ok(Vec::new())
    }
    async fn list(&self) -> Result<Vec<Issue>, IssueBackendError> {
        Ok(Vec::new())
    }
    async fn get(&self, _id: &str) -> Result<Issue, IssueBackendError> {
        Err(IssueBackendError::from_message("not found"))
    }
    async fn create(&self, _title: &str, _description: &str) -> Result<Issue, IssueBackendError> {
        Err(IssueBackendError::from_message("unsupported"))
    }
    async fn update(&self, issue: &Issue) -> Result<Issue, IssueBackendError> {
        Ok(issue.clone())
    }
    async fn close(&self, _id: &str) -> Result<(), IssueBackendError> {
        Ok(())
    }
}

fn test_config() -> OrchestratorConfig<FakeClock> {
    OrchestratorConfig { command: "cat".to_string(), ..OrchestratorConfig::default() }
}

#[tokio::test]
async fn register_project_starts_only_when_autostart_is_set() {
    let tmp = tempdir().expect("tempdir");
    let supervisor = Supervisor::new(FakeClock::new());

    let quiet = Arc::new(fixture_project(tmp.path(), "quiet", false).await);
    supervisor.register_project(quiet, Arc::new(EmptyIssueBackend), test_config());

    let loud = Arc::new(fixture_project(tmp.path(), "loud", true).await);
    supervisor.register_project(loud, Arc::new(EmptyIssueBackend), test_config());

    assert!(supervisor.orchestrator("quiet").is_some());
    let loud_orchestrator = supervisor.orchestrator("loud").expect("loud orchestrator registered");
    assert!(loud_orchestrator.is_running(), "autostart project should have a running poll loop");

    supervisor.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn shutdown_stops_orchestrators_and_leftover_agents() {
    let tmp = tempdir().expect("tempdir");
    let supervisor = Supervisor::new(FakeClock::new());
    let project = Arc::new(fixture_project(tmp.path(), "proj", false).await);
    let orchestrator = supervisor.register_project(Arc::clone(&project), Arc::new(EmptyIssueBackend), test_config());

    let agent = supervisor
        .manager()
        .create(&project, fab_core::AgentMode::Manual, None, fab_agent::Callbacks::default())
        .await
        .expect("create agent");
    let start_config = fab_agent::StartConfig::new("cat", agent.worktree_path.clone());
    agent.start(start_config).await.expect("start agent");

    supervisor.shutdown(Duration::from_secs(5)).await;

    assert!(agent.is_terminal());
    assert!(!orchestrator.is_running());
}
