// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The per-project control loop (spec.md §4.3 "Orchestrator"): spawns
//! agents against unclaimed ready tickets up to capacity, merges finished
//! work back into `main`, and stages or executes agent-directed actions.

use crate::error::OrchestratorError;
use crate::host::HostServer;
use crate::manager::AgentManager;
use fab_agent::{Agent, Callbacks, StartConfig};
use fab_core::{
    ActionQueue, ActionType, AgentId, AgentMode, Clock, ClaimRegistry, CommitLog, CommitRecord,
    DoneDetector, Issue, IssueBackend, StagedAction, SystemClock,
};
use fab_git::{MergeResult, Project as GitProject};
use parking_lot::Mutex as SyncMutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fired once a freshly created agent's process is up and its per-agent
/// `HostServer` is built, so the daemon can attach the read loop and bind
/// the RPC socket without the orchestrator needing to know their internals
/// (spec.md §4.3 "Configuration": "`OnAgentStarted` hook used by the daemon
/// to attach read loops"). The server's broadcast callbacks are already
/// wired into the agent by the time this fires; the hook's job is to call
/// `Agent::start_read_loop` and `HostServer::serve`.
pub type OnAgentStarted<C> = Arc<dyn Fn(&Arc<Agent<C>>, &Arc<HostServer>) + Send + Sync>;

/// Per-project knobs spec.md §4.3 groups under "Configuration".
pub struct OrchestratorConfig<C: Clock + 'static = SystemClock> {
    pub mode: AgentMode,
    pub kickstart_prompt: Option<String>,
    pub intervention_silence: Duration,
    pub poll_interval: Duration,
    pub command: String,
    pub command_args: Vec<String>,
    pub done_patterns: Option<Vec<String>>,
    /// Directory each agent's host socket is created under, as
    /// `<hosts_dir>/<agent_id>.sock` (spec.md §6 "Filesystem layout").
    pub hosts_dir: PathBuf,
    pub on_agent_started: Option<OnAgentStarted<C>>,
}

impl<C: Clock + 'static> Default for OrchestratorConfig<C> {
    fn default() -> Self {
        Self {
            mode: AgentMode::Manual,
            kickstart_prompt: None,
            intervention_silence: Duration::from_secs(60),
            poll_interval: Duration::from_secs(10),
            command: "claude".to_string(),
            command_args: Vec::new(),
            done_patterns: None,
            hosts_dir: std::env::temp_dir().join("fab-hosts"),
            on_agent_started: None,
        }
    }
}

pub struct Orchestrator<C: Clock + 'static = SystemClock> {
    project: Arc<GitProject>,
    manager: Arc<AgentManager<C>>,
    issue_backend: Arc<dyn IssueBackend>,
    claims: ClaimRegistry,
    actions: ActionQueue,
    commit_log: CommitLog,
    clock: C,
    config: OrchestratorConfig<C>,
    cancel: CancellationToken,
    join: SyncMutex<Option<JoinHandle<()>>>,
}

impl<C: Clock + 'static> Orchestrator<C> {
    pub fn new(
        project: Arc<GitProject>,
        manager: Arc<AgentManager<C>>,
        issue_backend: Arc<dyn IssueBackend>,
        clock: C,
        config: OrchestratorConfig<C>,
    ) -> Self {
        Self {
            project,
            manager,
            issue_backend,
            claims: ClaimRegistry::new(),
            actions: ActionQueue::new(),
            commit_log: CommitLog::default(),
            clock,
            config,
            cancel: CancellationToken::new(),
            join: SyncMutex::new(None),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project.config.name
    }

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    pub fn commit_log(&self) -> &CommitLog {
        &self.commit_log
    }

    /// Whether the poll loop is currently spawned (started and not yet
    /// stopped).
    pub fn is_running(&self) -> bool {
        self.join.lock().is_some()
    }

    /// Spawn the poll loop (spec.md §4.3 "Control loop"): runs
    /// `checkAndSpawnAgents` immediately, then on every poll tick until
    /// stopped.
    pub fn start(self: &Arc<Self>) {
        let orchestrator = Arc::clone(self);
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = orchestrator.check_and_spawn_agents().await {
                warn!(project = orchestrator.project_name(), error = %err, "initial spawn check failed");
            }
            let mut ticker = tokio::time::interval(orchestrator.config.poll_interval);
            ticker.tick().await; // consume the immediate first tick
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = orchestrator.check_and_spawn_agents().await {
                            warn!(project = orchestrator.project_name(), error = %err, "spawn check failed");
                        }
                    }
                }
            }
        });
        *self.join.lock() = Some(handle);
    }

    /// Signal the loop to stop and wait for it to finish (spec.md §4.5
    /// "Graceful shutdown": "signal all orchestrators to stop").
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.join.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// `available = MaxAgents − currentAgentCount`; spawn one agent per
    /// unclaimed ready ticket up to `available` (spec.md §4.3).
    pub async fn check_and_spawn_agents(self: &Arc<Self>) -> Result<usize, OrchestratorError> {
        let current = self.manager.count_for_project(self.project_name()) as u32;
        let available = self.project.config.max_agents.saturating_sub(current);
        if available == 0 {
            return Ok(0);
        }

        let ready = self.issue_backend.ready().await?;
        let unclaimed: Vec<Issue> = ready.into_iter().filter(|issue| !self.claims.is_claimed(&issue.id)).collect();
        let to_spawn = (available as usize).min(unclaimed.len());

        for issue in unclaimed.into_iter().take(to_spawn) {
            if let Err(err) = self.spawn_agent_for(issue.clone()).await {
                warn!(project = self.project_name(), ticket = %issue.id, error = %err, "failed to spawn agent");
            }
        }
        Ok(to_spawn)
    }

    /// Builds the agent's `HostServer` before the agent itself exists, so
    /// its broadcast callbacks are part of the `Callbacks` baked into
    /// `Agent::new` and no output can slip by unobserved (spec.md §4.4),
    /// and wires `handle_agent_done` to the done detector so a done-pattern
    /// match actually drives the merge/respawn pipeline (spec.md §4.3
    /// "Agent completion").
    async fn spawn_agent_for(self: &Arc<Self>, issue: Issue) -> Result<(), OrchestratorError> {
        let patterns = self.config.done_patterns.clone();
        let detector = match patterns {
            Some(patterns) => {
                DoneDetector::with_patterns(patterns).unwrap_or_else(|_| DoneDetector::new())
            }
            None => DoneDetector::new(),
        };

        let agent_id = AgentId::new();
        let socket_path = self.config.hosts_dir.join(format!("{}.sock", agent_id.as_str()));
        let (host_server, host_callbacks) =
            HostServer::build(agent_id.clone(), socket_path, self.config.command.clone(), self.clock.epoch_ms());

        let orchestrator = Arc::clone(self);
        let task_id = issue.id.clone();
        let done_agent_id = agent_id.as_str().to_string();
        let on_done: fab_agent::DoneCallback = Arc::new(move |_line| {
            let orchestrator = Arc::clone(&orchestrator);
            let agent_id = done_agent_id.clone();
            let task_id = task_id.clone();
            tokio::spawn(async move {
                if let Err(err) = orchestrator.handle_agent_done(&agent_id, &task_id, None).await {
                    warn!(agent_id, error = %err, "handle_agent_done failed");
                }
            });
        });
        let callbacks = host_callbacks.chain(Callbacks { on_done: Some(on_done), ..Callbacks::default() });

        let agent = self
            .manager
            .create_with_id(agent_id, &self.project, self.config.mode, Some(detector), callbacks)
            .await?;
        // A freshly minted agent id can never already hold a conflicting claim.
        let _ = self.claims.claim(&issue.id, agent.id.as_str());
        agent.set_task(issue.id.clone(), issue.title.clone());

        let mut start_config = StartConfig::new(self.config.command.clone(), agent.worktree_path.clone())
            .env("FAB_AGENT_ID", agent.id.as_str());
        for arg in &self.config.command_args {
            start_config = start_config.arg(arg.clone());
        }
        agent.start(start_config).await?;

        if let Some(hook) = &self.config.on_agent_started {
            hook(&agent, &host_server);
        }

        self.deliver_kickstart(&agent).await?;
        info!(project = self.project_name(), agent_id = %agent.id.as_str(), ticket = %issue.id, "spawned agent");
        Ok(())
    }

    /// Deliver the kickstart prompt immediately in `auto` mode, or stage it
    /// for approval in `manual` mode; suppressed while the user is actively
    /// driving the agent (spec.md §4.3).
    async fn deliver_kickstart(&self, agent: &Arc<Agent<C>>) -> Result<(), OrchestratorError> {
        let Some(prompt) = &self.config.kickstart_prompt else { return Ok(()) };
        if agent.is_user_intervening(self.config.intervention_silence) {
            return Ok(());
        }
        match self.config.mode {
            AgentMode::Auto => agent.send_message(prompt).await.map_err(OrchestratorError::from),
            AgentMode::Manual => {
                self.actions.stage(StagedAction::new(
                    agent.id.as_str(),
                    self.project_name(),
                    ActionType::SendMessage,
                    prompt.clone(),
                    self.clock.epoch_ms(),
                ));
                Ok(())
            }
        }
    }

    /// `HandleAgentDone` (spec.md §4.3 "Agent completion"): merge, then
    /// either retire the agent and replace it, or keep it alive on
    /// conflict after rebasing its worktree onto fresh `main`.
    pub async fn handle_agent_done(
        self: &Arc<Self>,
        agent_id: &str,
        task_id: &str,
        error_msg: Option<&str>,
    ) -> Result<MergeResult, OrchestratorError> {
        if let Some(msg) = error_msg {
            debug!(agent_id, task_id, error = msg, "agent reported done with an error message");
        }

        let description = self.manager.get(agent_id).and_then(|agent| agent.description());
        let result = self.project.merge_agent_branch(agent_id).await?;

        if result.merged {
            if let Some(sha) = &result.sha {
                self.commit_log.record(CommitRecord {
                    sha: sha.clone(),
                    branch: result.branch.clone(),
                    agent_id: agent_id.to_string(),
                    task_id: task_id.to_string(),
                    description: description.unwrap_or_default(),
                    merged_at_ms: self.clock.epoch_ms(),
                });
            }
            if let Err(err) = self.manager.stop(agent_id).await {
                warn!(agent_id, error = %err, "stop during completion cleanup failed");
            }
            self.manager.delete(&self.project, agent_id).await?;
            self.claims.release_by_agent(agent_id);
            self.check_and_spawn_agents().await?;
        } else {
            self.project.rebase_worktree_on_main(agent_id).await?;
        }
        Ok(result)
    }

    /// `ApproveAction(id)` (spec.md §4.3 "Action queue semantics").
    pub async fn approve_action(&self, action_id: &str) -> Result<(), OrchestratorError> {
        let not_found = || OrchestratorError::ActionNotFound { action_id: action_id.to_string() };
        let action = self.actions.get(action_id).ok_or_else(not_found)?;

        let Some(agent) = self.manager.get(&action.agent_id) else {
            self.actions.remove(action_id);
            return Err(not_found());
        };
        if agent.is_terminal() {
            self.actions.remove(action_id);
            return Err(not_found());
        }

        match action.action_type {
            ActionType::SendMessage => agent.send_message(&action.payload).await?,
            ActionType::Quit => agent.send_message("/quit").await?,
        }
        self.actions.remove(action_id);
        Ok(())
    }

    /// `RejectAction(id, reason)`: unconditional removal (spec.md §4.3).
    pub fn reject_action(&self, action_id: &str, reason: &str) {
        if self.actions.remove(action_id).is_some() {
            debug!(action_id, reason, "rejected staged action");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
