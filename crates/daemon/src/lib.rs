// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fab-daemon: the supervisor, per-project orchestrators, the agent
//! manager, and the per-agent host RPC server (spec.md §4.3, §4.4, §4.5).

pub mod config;
pub mod env;
pub mod error;
pub mod host;
pub mod manager;
pub mod orchestrator;
pub mod supervisor;

pub use config::{DaemonConfig, ProjectEntry};
pub use error::{DaemonError, HostError, ManagerError, OrchestratorError};
pub use host::HostServer;
pub use manager::{AgentEvent, AgentManager};
pub use orchestrator::Orchestrator;
pub use supervisor::Supervisor;
