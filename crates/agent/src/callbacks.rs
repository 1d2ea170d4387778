// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Read-loop and state-change callbacks (spec.md §4.1 `StartReadLoop`:
//! "invokes per-event callbacks (`OnEntry`, `OnOutput`, `OnError`)").
//!
//! Callback contract (spec.md §5 "Concurrency"): must not block, must not
//! re-enter `Agent` operations that take the same lock the caller invoked
//! them under. All four are invoked without holding the state lock.

use fab_core::{AgentState, ChatEntry};
use std::sync::Arc;

pub type EntryCallback = Arc<dyn Fn(&ChatEntry) + Send + Sync>;
pub type OutputCallback = Arc<dyn Fn(&str) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;
pub type StateChangeCallback = Arc<dyn Fn(AgentState, AgentState) + Send + Sync>;
pub type DoneCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_entry: Option<EntryCallback>,
    pub on_output: Option<OutputCallback>,
    pub on_error: Option<ErrorCallback>,
    pub on_state_change: Option<StateChangeCallback>,
    /// Fired with the matched text once the done detector fires and the
    /// transition to `Done` actually succeeds. Not invoked if the agent
    /// can no longer make that transition (spec.md §4.1 `CheckDoneAndTransition`:
    /// "if the state transition is disallowed, return no match").
    pub on_done: Option<DoneCallback>,
}

/// Compose two optional callbacks of the same shape into one that invokes
/// both, `a` first. `None` on either side just passes the other through.
macro_rules! chain_callback {
    ($a:expr, $b:expr, $arg:ident : $arg_ty:ty) => {
        match ($a, $b) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => {
                let merged = move |$arg: $arg_ty| {
                    a($arg);
                    b($arg);
                };
                Some(Arc::new(merged) as _)
            }
        }
    };
}

impl Callbacks {
    /// Compose two sets of callbacks so both fire for each event, `self`
    /// first. Lets a caller that builds its own lifecycle-event callbacks
    /// (e.g. an agent manager fanning out to `EventHandler`s) merge them
    /// with a second set built independently (e.g. a host server
    /// broadcasting the same events) before `Agent::new` bakes them in.
    pub fn chain(self, other: Callbacks) -> Callbacks {
        let on_state_change = match (self.on_state_change, other.on_state_change) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => {
                let merged = move |old: AgentState, new: AgentState| {
                    a(old, new);
                    b(old, new);
                };
                Some(Arc::new(merged) as StateChangeCallback)
            }
        };
        Callbacks {
            on_entry: chain_callback!(self.on_entry, other.on_entry, entry: &ChatEntry),
            on_output: chain_callback!(self.on_output, other.on_output, line: &str),
            on_error: chain_callback!(self.on_error, other.on_error, msg: &str),
            on_state_change,
            on_done: chain_callback!(self.on_done, other.on_done, line: &str),
        }
    }
}
