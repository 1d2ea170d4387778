// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fab-agent: the per-agent process controller (spec.md §4.1).
//!
//! Owns a spawned assistant subprocess, its stdio pipes, the JSONL read
//! loop, done-pattern integration, and the intervention-tracking clock.
//! Builds on `fab-core`'s pure state machine and data structures.

mod agent;
mod callbacks;
mod config;
mod error;
mod process;
mod read_loop;

pub use agent::{Agent, DEFAULT_STOP_TIMEOUT};
pub use callbacks::{
    Callbacks, DoneCallback, EntryCallback, ErrorCallback, OutputCallback, StateChangeCallback,
};
pub use config::{ReadLoopConfig, StartConfig};
pub use error::AgentRuntimeError;
