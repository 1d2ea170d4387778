// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! `fabd`: loads the daemon config, registers one orchestrator per
//! configured project, and serves until a termination signal arrives
//! (spec.md §1 lists "signal wiring" and "issue-tracker adapters" among
//! the things deliberately left as external collaborators).

use clap::Parser;
use fab_agent::ReadLoopConfig;
use fab_core::{Issue, IssueBackend, IssueBackendError, SystemClock};
use fab_daemon::orchestrator::OrchestratorConfig;
use fab_daemon::{env, DaemonConfig, DaemonError, Supervisor};
use fab_git::Project as GitProject;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fabd", about = "Supervises fleets of coding-assistant agents across git projects")]
struct Args {
    /// Path to the daemon's TOML config file.
    #[arg(long)]
    config: PathBuf,
}

/// Stand-in `IssueBackend` that never reports ready work. Real adapters
/// (GitHub Issues, Linear, beads, ...) are deliberately out of scope
/// (spec.md §1); this keeps `fabd` runnable with no tracker configured
/// until a project wires in a real one via `ProjectConfig::issue_backend`.
struct NullIssueBackend;

#[async_trait::async_trait]
impl IssueBackend for NullIssueBackend {
    async fn ready(&self) -> Result<Vec<Issue>, IssueBackendError> {
        Ok(Vec::new())
    }

    async fn list(&self) -> Result<Vec<Issue>, IssueBackendError> {
        Ok(Vec::new())
    }

    async fn get(&self, id: &str) -> Result<Issue, IssueBackendError> {
        Err(IssueBackendError::from_message(format!("no issue backend configured, cannot look up {id}")))
    }

    async fn create(&self, _title: &str, _description: &str) -> Result<Issue, IssueBackendError> {
        Err(IssueBackendError::from_message("no issue backend configured"))
    }

    async fn update(&self, issue: &Issue) -> Result<Issue, IssueBackendError> {
        Ok(issue.clone())
    }

    async fn close(&self, _id: &str) -> Result<(), IssueBackendError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    init_tracing();

    let args = Args::parse();
    let config = DaemonConfig::load(&args.config)?;
    let supervisor = Arc::new(Supervisor::new(SystemClock));
    let hosts_dir = env::hosts_dir(&env::fab_dir()?);
    let on_agent_started = build_on_agent_started(Arc::clone(supervisor.manager()));

    for entry in &config.projects {
        let project_name = entry.project.name.clone();
        let project = Arc::new(GitProject::new(entry.project.clone()));
        let orchestrator_config = OrchestratorConfig {
            mode: entry.mode,
            kickstart_prompt: entry.kickstart_prompt.clone(),
            intervention_silence: entry.intervention_silence(),
            poll_interval: entry.poll_interval(),
            hosts_dir: hosts_dir.clone(),
            on_agent_started: Some(Arc::clone(&on_agent_started)),
            ..OrchestratorConfig::default()
        };
        supervisor.register_project(project, Arc::new(NullIssueBackend), orchestrator_config);
        tracing::info!(project = %project_name, autostart = entry.project.autostart, "registered project");
    }

    wait_for_shutdown_signal().await?;
    tracing::info!("shutdown signal received, stopping orchestrators and agents");
    supervisor.shutdown(env::shutdown_timeout()).await;
    Ok(())
}

/// Builds the hook the orchestrator fires once a spawned agent's process is
/// up: attach its read loop, then bring its host RPC socket up (spec.md §4.3
/// "Configuration": "`OnAgentStarted` hook used by the daemon to attach read
/// loops"). Both are deferred past construction since they're fallible and
/// long-running; the server's broadcast callbacks are already wired into the
/// agent by the time this fires.
fn build_on_agent_started(
    manager: Arc<fab_daemon::AgentManager<SystemClock>>,
) -> fab_daemon::orchestrator::OnAgentStarted<SystemClock> {
    Arc::new(move |agent, host_server| {
        let agent = Arc::clone(agent);
        let host_server = Arc::clone(host_server);
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            if let Err(err) = agent.start_read_loop(ReadLoopConfig::default()).await {
                tracing::warn!(agent_id = %agent.id.as_str(), error = %err, "failed to start read loop");
                return;
            }
            if let Err(err) = host_server.serve(agent, manager).await {
                tracing::warn!(error = %err, "host server exited");
            }
        });
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Waits for `SIGTERM` or `SIGINT` (spec.md §1 "signal wiring" is an
/// external-collaborator concern; this is the daemon binary's wiring of
/// it, not the core).
async fn wait_for_shutdown_signal() -> Result<(), DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    }
    Ok(())
}
