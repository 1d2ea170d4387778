// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Process-wide composition (spec.md §4.5 "Supervisor"): owns the project
//! registry, the agent manager, and one orchestrator per running project.

use crate::manager::AgentManager;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use fab_core::{Clock, IssueBackend, SystemClock};
use fab_git::Project as GitProject;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct Supervisor<C: Clock + 'static = SystemClock> {
    manager: Arc<AgentManager<C>>,
    clock: C,
    orchestrators: RwLock<HashMap<String, Arc<Orchestrator<C>>>>,
}

impl<C: Clock + 'static> Supervisor<C> {
    pub fn new(clock: C) -> Self {
        Self { manager: Arc::new(AgentManager::new(clock.clone())), clock, orchestrators: RwLock::new(HashMap::new()) }
    }

    pub fn manager(&self) -> &Arc<AgentManager<C>> {
        &self.manager
    }

    /// Register a project's orchestrator. Starts it immediately if the
    /// project's config marks it `autostart` (spec.md §4.5 "Autostart
    /// policy at daemon boot").
    pub fn register_project(
        &self,
        project: Arc<GitProject>,
        issue_backend: Arc<dyn IssueBackend>,
        config: OrchestratorConfig<C>,
    ) -> Arc<Orchestrator<C>> {
        let name = project.config.name.clone();
        let autostart = project.config.autostart;
        let orchestrator =
            Arc::new(Orchestrator::new(project, Arc::clone(&self.manager), issue_backend, self.clock.clone(), config));
        self.orchestrators.write().insert(name.clone(), Arc::clone(&orchestrator));
        if autostart {
            info!(project = %name, "autostarting orchestrator");
            orchestrator.start();
        }
        orchestrator
    }

    pub fn orchestrator(&self, project: &str) -> Option<Arc<Orchestrator<C>>> {
        self.orchestrators.read().get(project).cloned()
    }

    pub fn orchestrators(&self) -> Vec<Arc<Orchestrator<C>>> {
        self.orchestrators.read().values().cloned().collect()
    }

    /// Graceful shutdown (spec.md §4.5): signal every orchestrator to
    /// stop, wait up to `timeout`, then stop all agents regardless of
    /// whether the orchestrators finished in time.
    pub async fn shutdown(&self, timeout: Duration) {
        let orchestrators = self.orchestrators();
        let stop_all = async {
            for orchestrator in &orchestrators {
                orchestrator.stop().await;
            }
        };
        if tokio::time::timeout(timeout, stop_all).await.is_err() {
            warn!("orchestrators did not stop within the shutdown timeout, stopping agents anyway");
        }
        for agent in self.manager.list() {
            if let Err(err) = agent.stop().await {
                warn!(agent_id = %agent.id.as_str(), error = %err, "error stopping agent during shutdown");
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
