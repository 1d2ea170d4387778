// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fab-core: data model and pure logic shared by every fab crate.
//!
//! Nothing in this crate touches a filesystem, spawns a process, or opens
//! a socket — that's `fab-git`, `fab-agent`, and `fab-daemon`'s job. This
//! crate is the part of the system that can be exhaustively unit tested
//! without an external assistant CLI or a git repository on disk.

pub mod macros;

pub mod action_queue;
pub mod agent;
pub mod chat;
pub mod claim;
pub mod clock;
pub mod commit_log;
pub mod done_detector;
pub mod id;
pub mod issue;
pub mod project;
pub mod ring_buffer;
pub mod stream;
pub mod worktree;

pub use action_queue::{ActionQueue, ActionType, StagedAction};
pub use agent::{AgentError, AgentId, AgentMode, AgentState};
pub use chat::{ChatEntry, ChatHistory, ChatRole};
pub use claim::{ClaimError, ClaimRegistry};
pub use clock::{Clock, FakeClock, SystemClock};
pub use commit_log::{CommitLog, CommitRecord};
pub use done_detector::{DoneDetector, Match};
pub use issue::{Issue, IssueBackend, IssueBackendError, IssueStatus};
pub use project::ProjectConfig;
pub use ring_buffer::RingBuffer;
pub use stream::{
    AssistantLine, AssistantMessage, ContentBlock, FlexContent, InputMessage, InputSubmission,
    StreamEvent, StreamEventKind, Usage,
};
pub use worktree::Worktree;
