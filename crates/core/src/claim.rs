// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Ticket claim registry (spec.md §3 "Claim registry", §4.3).
//!
//! Per-orchestrator, in-memory mapping of ticket id to the agent working
//! it. Claims are released on successful merge, or in bulk when an agent
//! is torn down (spec.md §3 invariant (iii)).

use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("ticket {ticket_id} already claimed by a different agent")]
    AlreadyClaimed { ticket_id: String },
}

/// Maps ticket id to the agent id that has claimed it.
pub struct ClaimRegistry {
    claims: Mutex<HashMap<String, String>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self { claims: Mutex::new(HashMap::new()) }
    }

    /// Claim `ticket_id` for `agent_id`. Idempotent if already claimed by
    /// the same agent; fails with [`ClaimError::AlreadyClaimed`] if held by
    /// a different agent.
    pub fn claim(&self, ticket_id: &str, agent_id: &str) -> Result<(), ClaimError> {
        let mut claims = self.claims.lock();
        match claims.get(ticket_id) {
            Some(holder) if holder == agent_id => Ok(()),
            Some(_) => Err(ClaimError::AlreadyClaimed { ticket_id: ticket_id.to_string() }),
            None => {
                claims.insert(ticket_id.to_string(), agent_id.to_string());
                Ok(())
            }
        }
    }

    /// Is this ticket currently claimed by anyone?
    pub fn is_claimed(&self, ticket_id: &str) -> bool {
        self.claims.lock().contains_key(ticket_id)
    }

    /// Release a single ticket, regardless of holder. No-op if unclaimed.
    pub fn release(&self, ticket_id: &str) {
        self.claims.lock().remove(ticket_id);
    }

    /// Release every ticket held by `agent_id` (spec.md §4.3 "releases all
    /// ticket claims held by that agent").
    pub fn release_by_agent(&self, agent_id: &str) {
        self.claims.lock().retain(|_, holder| holder != agent_id);
    }

    /// Ticket ids currently claimed by `agent_id`.
    pub fn claimed_by(&self, agent_id: &str) -> Vec<String> {
        self.claims
            .lock()
            .iter()
            .filter(|(_, holder)| holder.as_str() == agent_id)
            .map(|(ticket_id, _)| ticket_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.claims.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ClaimRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod tests;
