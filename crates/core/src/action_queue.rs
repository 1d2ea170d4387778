// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Staged-action queue for manual-approval mode (spec.md §3 "Action
//! queue", §4.3 "Action queue semantics").

use crate::id::new_short_hex;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    Quit,
}

crate::simple_display! {
    ActionType {
        SendMessage => "send_message",
        Quit => "quit",
    }
}

/// An action staged against an agent, awaiting manual approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedAction {
    pub id: String,
    pub agent_id: String,
    pub project: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payload: String,
    pub created_at_ms: u64,
}

impl StagedAction {
    pub fn new(
        agent_id: impl Into<String>,
        project: impl Into<String>,
        action_type: ActionType,
        payload: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: new_short_hex(),
            agent_id: agent_id.into(),
            project: project.into(),
            action_type,
            payload: payload.into(),
            created_at_ms,
        }
    }
}

/// Ordered, mutex-protected queue of [`StagedAction`]s.
///
/// Actions are removed only on successful execution or explicit
/// rejection (spec.md §4.3: "removes from the queue *only on success*,
/// enabling transient-failure retries").
pub struct ActionQueue {
    actions: Mutex<VecDeque<StagedAction>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self { actions: Mutex::new(VecDeque::new()) }
    }

    pub fn stage(&self, action: StagedAction) {
        self.actions.lock().push_back(action);
    }

    /// Look up a staged action by id without removing it (the orchestrator
    /// fetches, attempts execution, then calls [`ActionQueue::remove`] only
    /// on success).
    pub fn get(&self, id: &str) -> Option<StagedAction> {
        self.actions.lock().iter().find(|a| a.id == id).cloned()
    }

    /// Unconditionally remove an action, e.g. a stale one whose agent is
    /// gone, or a successfully executed one, or a rejection.
    pub fn remove(&self, id: &str) -> Option<StagedAction> {
        let mut actions = self.actions.lock();
        let pos = actions.iter().position(|a| a.id == id)?;
        actions.remove(pos)
    }

    pub fn pending(&self) -> Vec<StagedAction> {
        self.actions.lock().iter().cloned().collect()
    }

    pub fn pending_for_agent(&self, agent_id: &str) -> Vec<StagedAction> {
        self.actions.lock().iter().filter(|a| a.agent_id == agent_id).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "action_queue_tests.rs"]
mod tests;
