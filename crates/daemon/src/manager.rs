// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The agent manager (spec.md §4.5 "Agent manager"): `map[agentID]→Agent`
//! and `map[projectName]→[]Agent` behind a single RW lock, with lifecycle
//! events fanned out to subscribed handlers outside the lock.

use crate::error::ManagerError;
use fab_agent::{Agent, Callbacks, EntryCallback, StateChangeCallback};
use fab_core::{AgentId, AgentMode, AgentState, Clock, DoneDetector, SystemClock};
use fab_git::Project as GitProject;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle event fanned out to every handler registered via
/// [`AgentManager::on_event`] (spec.md §4.5: "`Event{type ∈
/// created|state_changed|info_changed|deleted, agent, old/new state}`").
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Created { agent_id: String, project: String },
    StateChanged { agent_id: String, old: AgentState, new: AgentState },
    InfoChanged { agent_id: String },
    Deleted { agent_id: String, project: String },
}

type EventHandler = Arc<dyn Fn(&AgentEvent) + Send + Sync>;

struct Inner<C: Clock + 'static> {
    agents: HashMap<String, Arc<Agent<C>>>,
    by_project: HashMap<String, Vec<String>>,
}

pub struct AgentManager<C: Clock + 'static = SystemClock> {
    clock: C,
    inner: RwLock<Inner<C>>,
    handlers: Arc<RwLock<Vec<EventHandler>>>,
}

impl<C: Clock + 'static> AgentManager<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            inner: RwLock::new(Inner { agents: HashMap::new(), by_project: HashMap::new() }),
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn on_event(&self, handler: EventHandler) {
        self.handlers.write().push(handler);
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<Agent<C>>> {
        self.inner.read().agents.get(agent_id).cloned()
    }

    pub fn list(&self) -> Vec<Arc<Agent<C>>> {
        self.inner.read().agents.values().cloned().collect()
    }

    pub fn list_for_project(&self, project: &str) -> Vec<Arc<Agent<C>>> {
        let inner = self.inner.read();
        inner.by_project.get(project).into_iter().flatten().filter_map(|id| inner.agents.get(id).cloned()).collect()
    }

    pub fn count_for_project(&self, project: &str) -> usize {
        self.inner.read().by_project.get(project).map(Vec::len).unwrap_or(0)
    }

    /// Build worktree, construct the `Agent`, register it under both
    /// indices, and fan out `Created` (spec.md §4.5 `Create(project)`).
    /// `extra_callbacks` is merged in alongside the manager's own
    /// lifecycle-event wiring (e.g. a host server's broadcast callbacks).
    pub async fn create(
        &self,
        git_project: &GitProject,
        mode: AgentMode,
        done_detector: Option<DoneDetector>,
        extra_callbacks: Callbacks,
    ) -> Result<Arc<Agent<C>>, ManagerError> {
        self.create_with_id(AgentId::new(), git_project, mode, done_detector, extra_callbacks).await
    }

    /// Like [`create`](Self::create), but with a caller-chosen id. Lets a
    /// caller that needs the id before the agent exists — the orchestrator
    /// binding a per-agent host socket to it — allocate it up front.
    pub async fn create_with_id(
        &self,
        id: AgentId,
        git_project: &GitProject,
        mode: AgentMode,
        done_detector: Option<DoneDetector>,
        extra_callbacks: Callbacks,
    ) -> Result<Arc<Agent<C>>, ManagerError> {
        let project_name = git_project.config.name.clone();
        if self.count_for_project(&project_name) as u32 >= git_project.config.max_agents {
            return Err(ManagerError::NoCapacity { project: project_name, max_agents: git_project.config.max_agents });
        }

        let worktree = git_project.create_worktree_for_agent(id.as_str()).await?;

        let callbacks = self.event_callbacks(id.as_str()).chain(extra_callbacks);
        let agent = Arc::new(Agent::new(
            id.clone(),
            project_name.clone(),
            worktree.path.clone(),
            mode,
            done_detector,
            callbacks,
            self.clock.clone(),
        ));

        {
            let mut inner = self.inner.write();
            inner.agents.insert(id.as_str().to_string(), Arc::clone(&agent));
            inner.by_project.entry(project_name.clone()).or_default().push(id.as_str().to_string());
        }
        emit(&self.handlers, AgentEvent::Created { agent_id: id.as_str().to_string(), project: project_name });
        Ok(agent)
    }

    /// State-change and chat-entry callbacks that fan out `StateChanged`/
    /// `InfoChanged` events to every subscribed handler, scoped to one
    /// agent id (spec.md §4.5 "registers state-change and info-change
    /// callbacks").
    fn event_callbacks(&self, agent_id: &str) -> Callbacks {
        let handlers = Arc::clone(&self.handlers);
        let id = agent_id.to_string();
        let on_state_change: StateChangeCallback = Arc::new(move |old, new| {
            emit(&handlers, AgentEvent::StateChanged { agent_id: id.clone(), old, new });
        });

        let handlers = Arc::clone(&self.handlers);
        let id = agent_id.to_string();
        let on_entry: EntryCallback = Arc::new(move |_entry| {
            emit(&handlers, AgentEvent::InfoChanged { agent_id: id.clone() });
        });

        Callbacks { on_state_change: Some(on_state_change), on_entry: Some(on_entry), ..Default::default() }
    }

    /// Stop the agent's process and read loop, marking it `Done` if it
    /// hadn't already reached a terminal state (spec.md §4.5 `Stop(id)`).
    pub async fn stop(&self, agent_id: &str) -> Result<bool, ManagerError> {
        self.stop_with_timeout(agent_id, fab_agent::DEFAULT_STOP_TIMEOUT).await
    }

    /// `Stop` with a caller-supplied grace period, for `host.stop`'s
    /// request-level `timeout` field (spec.md §6 `host.stop` request).
    pub async fn stop_with_timeout(&self, agent_id: &str, timeout: std::time::Duration) -> Result<bool, ManagerError> {
        let agent = self.require(agent_id)?;
        let graceful = agent.stop_with_timeout(timeout).await?;
        if agent.is_active() {
            let _ = agent.mark_done();
        }
        Ok(graceful)
    }

    /// Remove from both indices and delete the on-disk worktree (spec.md
    /// §4.5 `Delete(id)`).
    pub async fn delete(&self, git_project: &GitProject, agent_id: &str) -> Result<(), ManagerError> {
        let project = {
            let mut inner = self.inner.write();
            let agent = inner
                .agents
                .remove(agent_id)
                .ok_or_else(|| ManagerError::AgentNotFound { agent_id: agent_id.to_string() })?;
            let project = agent.project.clone();
            if let Some(ids) = inner.by_project.get_mut(&project) {
                ids.retain(|id| id != agent_id);
            }
            project
        };
        git_project.delete_worktree_for_agent(agent_id).await?;
        emit(&self.handlers, AgentEvent::Deleted { agent_id: agent_id.to_string(), project });
        Ok(())
    }

    fn require(&self, agent_id: &str) -> Result<Arc<Agent<C>>, ManagerError> {
        self.get(agent_id).ok_or_else(|| ManagerError::AgentNotFound { agent_id: agent_id.to_string() })
    }
}

fn emit(handlers: &Arc<RwLock<Vec<EventHandler>>>, event: AgentEvent) {
    for handler in handlers.read().iter() {
        handler(&event);
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
