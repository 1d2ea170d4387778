// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The per-agent process controller (spec.md §4.1).
//!
//! Owns a single child process, its stdin/stdout, a ring buffer, a chat
//! history, an optional done detector, and the state machine. Mutable
//! fields are split across locks per spec.md §5: a sync lock for state
//! and bookkeeping (never held across an `.await`), and separate async
//! locks for the process handle and the read-loop control channel so
//! stopping the loop does not contend with normal RPC reads.

use crate::callbacks::Callbacks;
use crate::config::{ReadLoopConfig, StartConfig};
use crate::error::AgentRuntimeError;
use crate::process::{self, SpawnedProcess};
use crate::read_loop;
use fab_core::{AgentId, AgentMode, AgentState, Clock, DoneDetector, RingBuffer, SystemClock};
use fab_core::{ChatHistory, InputSubmission};
use parking_lot::{Mutex as SyncMutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

const DEFAULT_RING_CAPACITY: usize = 2000;
const DEFAULT_CHAT_CAPACITY: usize = 500;
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

struct ProcessHandle {
    child: Child,
    stdin: ChildStdin,
}

#[derive(Default)]
struct ReadLoopHandle {
    cancel: Option<CancellationToken>,
    join: Option<tokio::task::JoinHandle<()>>,
}

pub struct Agent<C: Clock = SystemClock> {
    pub id: AgentId,
    pub project: String,
    pub worktree_path: PathBuf,
    pub created_at_ms: u64,

    state: RwLock<AgentState>,
    task_id: RwLock<Option<String>>,
    description: RwLock<Option<String>>,
    mode: RwLock<AgentMode>,
    updated_at_ms: AtomicU64,
    last_user_input_ms: AtomicU64,
    exit_error: SyncMutex<Option<String>>,
    exit_code: SyncMutex<Option<i32>>,

    pub ring_buffer: RingBuffer,
    pub chat_history: ChatHistory,
    done_detector: Option<DoneDetector>,

    process: AsyncMutex<Option<ProcessHandle>>,
    stdout: AsyncMutex<Option<ChildStdout>>,
    read_loop: AsyncMutex<ReadLoopHandle>,

    pub(crate) callbacks: Callbacks,
    pub(crate) clock: C,
}

impl<C: Clock + 'static> Agent<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AgentId,
        project: impl Into<String>,
        worktree_path: PathBuf,
        mode: AgentMode,
        done_detector: Option<DoneDetector>,
        callbacks: Callbacks,
        clock: C,
    ) -> Self {
        let now = clock.epoch_ms();
        Self {
            id,
            project: project.into(),
            worktree_path,
            created_at_ms: now,
            state: RwLock::new(AgentState::Starting),
            task_id: RwLock::new(None),
            description: RwLock::new(None),
            mode: RwLock::new(mode),
            updated_at_ms: AtomicU64::new(now),
            last_user_input_ms: AtomicU64::new(0),
            exit_error: SyncMutex::new(None),
            exit_code: SyncMutex::new(None),
            ring_buffer: RingBuffer::new(DEFAULT_RING_CAPACITY),
            chat_history: ChatHistory::new(DEFAULT_CHAT_CAPACITY),
            done_detector,
            process: AsyncMutex::new(None),
            stdout: AsyncMutex::new(None),
            read_loop: AsyncMutex::new(ReadLoopHandle::default()),
            callbacks,
            clock,
        }
    }

    // --- state query / transition (spec.md §4.1) ---------------------

    pub fn state(&self) -> AgentState {
        *self.state.read()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn task_id(&self) -> Option<String> {
        self.task_id.read().clone()
    }

    pub fn description(&self) -> Option<String> {
        self.description.read().clone()
    }

    pub fn set_task(&self, task_id: impl Into<String>, description: impl Into<String>) {
        *self.task_id.write() = Some(task_id.into());
        *self.description.write() = Some(description.into());
    }

    pub fn mode(&self) -> AgentMode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: AgentMode) {
        *self.mode.write() = mode;
    }

    pub fn updated_at_ms(&self) -> u64 {
        self.updated_at_ms.load(Ordering::Relaxed)
    }

    pub fn exit_error(&self) -> Option<String> {
        self.exit_error.lock().clone()
    }

    /// The process's exit code, once it has been waited on.
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock()
    }

    /// The child process's OS pid, if one is currently running.
    pub async fn pid(&self) -> Option<u32> {
        self.process.lock().await.as_ref().and_then(|handle| handle.child.id())
    }

    /// Attempt `self.state -> target`, clearing the task on reaching a
    /// terminal state and invoking the state-change callback synchronously
    /// after the field updates (spec.md §4.1).
    pub fn transition(&self, target: AgentState) -> Result<AgentState, AgentRuntimeError> {
        let old = {
            let mut state = self.state.write();
            let next = state.transition(target)?;
            let old = *state;
            *state = next;
            old
        };
        if target.is_terminal() {
            *self.task_id.write() = None;
            *self.description.write() = None;
        }
        self.updated_at_ms.store(self.clock.epoch_ms(), Ordering::Relaxed);
        if let Some(cb) = &self.callbacks.on_state_change {
            cb(old, target);
        }
        Ok(target)
    }

    pub fn mark_running(&self) -> Result<AgentState, AgentRuntimeError> {
        self.transition(AgentState::Running)
    }

    pub fn mark_idle(&self) -> Result<AgentState, AgentRuntimeError> {
        self.transition(AgentState::Idle)
    }

    pub fn mark_done(&self) -> Result<AgentState, AgentRuntimeError> {
        self.transition(AgentState::Done)
    }

    pub fn mark_error(&self) -> Result<AgentState, AgentRuntimeError> {
        self.transition(AgentState::Error)
    }

    /// `Done|Error -> Starting`, clearing the task (spec.md §4.1 `Reset`).
    pub fn reset(&self) -> Result<AgentState, AgentRuntimeError> {
        self.transition(AgentState::Starting)
    }

    // --- intervention tracking (spec.md §4.1 "Intervention tracking") -

    pub fn is_user_intervening(&self, threshold: Duration) -> bool {
        let last = self.last_user_input_ms.load(Ordering::Relaxed);
        if last == 0 {
            return false;
        }
        let now = self.clock.epoch_ms();
        now.saturating_sub(last) <= threshold.as_millis() as u64
    }

    fn record_user_input(&self) {
        self.last_user_input_ms.store(self.clock.epoch_ms(), Ordering::Relaxed);
    }

    // --- process lifecycle (spec.md §4.1 `Start`/`Stop`/`SendMessage`) -

    pub async fn start(&self, config: StartConfig) -> Result<(), AgentRuntimeError> {
        {
            let process = self.process.lock().await;
            if process.is_some() {
                return Err(fab_core::AgentError::ProcessAlreadyStarted.into());
            }
        }

        match process::spawn(&config, self.id.as_str()) {
            Ok(SpawnedProcess { child, stdin, stdout }) => {
                *self.process.lock().await = Some(ProcessHandle { child, stdin });
                *self.stdout.lock().await = Some(stdout);
                Ok(())
            }
            Err(err) => {
                *self.exit_error.lock() = Some(err.to_string());
                let _ = self.mark_error();
                Err(err)
            }
        }
    }

    pub async fn send_message(&self, content: &str) -> Result<(), AgentRuntimeError> {
        let mut process = self.process.lock().await;
        let Some(handle) = process.as_mut() else {
            return Err(fab_core::AgentError::ProcessNotStarted.into());
        };
        let line = InputSubmission::new(self.id.as_str(), content);
        let mut payload =
            serde_json::to_string(&line).map_err(|e| AgentRuntimeError::WriteFailed(std::io::Error::other(e)))?;
        payload.push('\n');
        handle.stdin.write_all(payload.as_bytes()).await.map_err(AgentRuntimeError::WriteFailed)?;
        drop(process);
        self.record_user_input();
        Ok(())
    }

    pub async fn stop(&self) -> Result<bool, AgentRuntimeError> {
        self.stop_with_timeout(DEFAULT_STOP_TIMEOUT).await
    }

    /// Close stdin (signaling graceful shutdown), wait up to `timeout`,
    /// then force-kill. Guarantees the read loop has stopped before
    /// returning (spec.md §4.1 `Stop`/`StopWithTimeout`).
    pub async fn stop_with_timeout(&self, timeout: Duration) -> Result<bool, AgentRuntimeError> {
        let mut process = self.process.lock().await;
        let Some(mut handle) = process.take() else {
            return Err(fab_core::AgentError::ProcessNotStarted.into());
        };
        drop(handle.stdin); // closes stdin, signaling graceful shutdown

        let graceful = match tokio::time::timeout(timeout, handle.child.wait()).await {
            Ok(result) => {
                if let Ok(status) = result {
                    *self.exit_code.lock() = status.code();
                }
                true
            }
            Err(_) => {
                let _ = handle.child.start_kill();
                if let Ok(status) = handle.child.wait().await {
                    *self.exit_code.lock() = status.code();
                }
                false
            }
        };
        drop(process);

        self.stop_read_loop().await;
        Ok(graceful)
    }

    // --- read loop (spec.md §4.1 `StartReadLoop`) ---------------------

    pub async fn start_read_loop(self: &Arc<Self>, config: ReadLoopConfig) -> Result<(), AgentRuntimeError> {
        let mut read_loop = self.read_loop.lock().await;
        if read_loop.join.is_some() {
            return Err(fab_core::AgentError::ReadLoopAlreadyRunning.into());
        }
        let stdout = {
            let mut stdout = self.stdout.lock().await;
            stdout.take()
        };
        let Some(stdout) = stdout else {
            return Err(fab_core::AgentError::ProcessNotStarted.into());
        };

        let cancel = CancellationToken::new();
        let agent = Arc::clone(self);
        let child_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            read_loop::run(agent, stdout, config, child_cancel).await;
        });
        read_loop.cancel = Some(cancel);
        read_loop.join = Some(join);
        Ok(())
    }

    async fn stop_read_loop(&self) {
        let mut read_loop = self.read_loop.lock().await;
        if let Some(cancel) = read_loop.cancel.take() {
            cancel.cancel();
        }
        if let Some(join) = read_loop.join.take() {
            let _ = join.await;
        }
    }

    pub(crate) fn done_detector(&self) -> Option<&DoneDetector> {
        self.done_detector.as_ref()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
