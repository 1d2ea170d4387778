// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Daemon configuration: a project list plus the per-project orchestrator
//! settings spec.md §4.3 calls "Configuration" (default mode, kickstart
//! prompt, intervention-silence threshold, poll interval). Deliberately
//! small — spec.md's "config file formats" non-goal excludes a rich
//! format, this is just enough for the `fabd` binary to have projects to
//! autostart.

use fab_core::{AgentMode, ProjectConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectEntry>,
}

/// One project's repo config plus the orchestrator knobs spec.md §4.3
/// lists under "Configuration".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(flatten)]
    pub project: ProjectConfig,

    #[serde(default = "default_mode")]
    pub mode: AgentMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickstart_prompt: Option<String>,

    #[serde(default = "default_intervention_silence_secs")]
    pub intervention_silence_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_mode() -> AgentMode {
    AgentMode::Manual
}

fn default_intervention_silence_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    10
}

impl ProjectEntry {
    pub fn intervention_silence(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.intervention_silence_secs)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, crate::error::DaemonError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn project(&self, name: &str) -> Option<&ProjectEntry> {
        self.projects.iter().find(|p| p.project.name == name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
