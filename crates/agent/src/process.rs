// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Process spawn for the assistant CLI (spec.md §4.1 `Start`).
//!
//! Grounded on the teacher's coop spawn flow (`adapters/agent/coop/spawn.rs`):
//! piped stdio, environment forwarding, a detached reaper task that waits on
//! the child and logs its exit. Simplified relative to the teacher: fab
//! spawns the assistant command directly rather than through a wrapper
//! process, since the assistant already speaks line-delimited JSON on its
//! own stdout.

use crate::error::AgentRuntimeError;
use crate::config::StartConfig;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};

/// A freshly spawned assistant process, stdin/stdout split off for the
/// agent's read/write operations; `child` remains for id()/kill()/wait().
pub struct SpawnedProcess {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

/// Spawn the configured assistant command in the agent's worktree, with a
/// project-scoped environment variable carrying the agent id (spec.md
/// §4.1 `Start`).
pub fn spawn(config: &StartConfig, agent_id: &str) -> Result<SpawnedProcess, AgentRuntimeError> {
    let mut cmd = tokio::process::Command::new(&config.command);
    cmd.args(&config.args)
        .current_dir(&config.cwd)
        .env("FAB_AGENT_ID", agent_id)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &config.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(AgentRuntimeError::SpawnFailed)?;
    let stdin = child.stdin.take().ok_or_else(|| {
        AgentRuntimeError::SpawnFailed(std::io::Error::other("child stdin was not piped"))
    })?;
    let stdout = child.stdout.take().ok_or_else(|| {
        AgentRuntimeError::SpawnFailed(std::io::Error::other("child stdout was not piped"))
    })?;
    if let Some(stderr) = child.stderr.take() {
        spawn_stderr_logger(agent_id.to_string(), stderr);
    }

    Ok(SpawnedProcess { child, stdin, stdout })
}

/// Drain the child's stderr into tracing logs rather than letting it pile
/// up in an unread pipe.
fn spawn_stderr_logger(agent_id: String, stderr: tokio::process::ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tracing::warn!(agent_id = %agent_id, %line, "agent stderr"),
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(agent_id = %agent_id, error = %err, "error reading agent stderr");
                    break;
                }
            }
        }
    });
}
