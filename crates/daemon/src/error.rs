// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Error taxonomy for the manager, orchestrator, host server, and binary
//! entrypoint (spec.md §7: "Capacity errors", "Not-found", "Protocol
//! errors"), mirroring the teacher's `ConnectionError`/`LifecycleError`
//! per-component enums.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("project {project} is at capacity ({max_agents} agents)")]
    NoCapacity { project: String, max_agents: u32 },

    #[error("no agent with id {agent_id}")]
    AgentNotFound { agent_id: String },

    #[error(transparent)]
    Git(#[from] fab_git::GitError),

    #[error(transparent)]
    Agent(#[from] fab_agent::AgentRuntimeError),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error(transparent)]
    IssueBackend(#[from] fab_core::IssueBackendError),

    #[error(transparent)]
    Git(#[from] fab_git::GitError),

    #[error(transparent)]
    Agent(#[from] fab_agent::AgentRuntimeError),

    #[error("no staged action with id {action_id}")]
    ActionNotFound { action_id: String },

    #[error("no project named {name}")]
    ProjectNotFound { name: String },
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Proto(#[from] fab_proto::ProtoError),

    #[error(transparent)]
    Agent(#[from] fab_agent::AgentRuntimeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("no state directory: set FAB_STATE_DIR or HOME")]
    NoStateDir,

    #[error("no project named {name}")]
    ProjectNotFound { name: String },
}
