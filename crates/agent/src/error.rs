// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Error taxonomy for the agent process controller (spec.md §7 "External
//! errors"). Wraps [`fab_core::AgentError`] (the pure state-machine and
//! lifecycle-precondition taxonomy) with I/O-flavored failures specific to
//! owning a real child process.

use fab_core::AgentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentRuntimeError {
    #[error(transparent)]
    State(#[from] AgentError),

    #[error("failed to spawn assistant process: {0}")]
    SpawnFailed(std::io::Error),

    #[error("failed to write to assistant stdin: {0}")]
    WriteFailed(std::io::Error),

    #[error("failed to read assistant stdout: {0}")]
    ReadFailed(std::io::Error),
}
