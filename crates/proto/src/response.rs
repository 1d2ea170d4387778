// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The host RPC response envelope and its per-command payload shapes
//! (spec.md §4.4, §6 "Host RPC wire format" table).

use serde::{Deserialize, Serialize};

/// `Response {type, id, success, error, payload}` (spec.md §4.4). The
/// server echoes the request's `type` and `id` for correlation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Response {
    pub fn ok(id: impl Into<String>, type_name: &str, payload: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: id.into(),
            kind: type_name.to_string(),
            success: true,
            error: None,
            payload: Some(serde_json::to_value(payload)?),
        })
    }

    pub fn ok_empty(id: impl Into<String>, type_name: &str) -> Self {
        Self { id: id.into(), kind: type_name.to_string(), success: true, error: None, payload: None }
    }

    /// A malformed-request or handler failure (spec.md §7 "Propagation
    /// policy": "RPC handlers convert errors to `Response{success:false,error}`
    /// envelopes; the connection stays open.").
    pub fn err(id: impl Into<String>, type_name: &str, error: impl std::fmt::Display) -> Self {
        Self {
            id: id.into(),
            kind: type_name.to_string(),
            success: false,
            error: Some(error.to_string()),
            payload: None,
        }
    }
}

/// `host.ping` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PingPayload {
    pub version: String,
    pub protocol_version: String,
    pub uptime_secs: u64,
    pub started_at: String,
}

/// `host.status` host-section payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostInfo {
    pub pid: u32,
    pub version: String,
    pub protocol_version: String,
    pub started_at: String,
    pub socket_path: String,
}

/// Summary of one agent, used in both `host.status` and `host.list`
/// (spec.md §6 `AgentInfo`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInfo {
    pub id: String,
    pub project: String,
    pub state: String,
    pub pid: Option<u32>,
    pub worktree: String,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPayload {
    pub host: HostInfo,
    pub agent: AgentInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPayload {
    pub agents: Vec<AgentInfo>,
}

/// `host.attach` response payload. `truncated` is additive relative to
/// spec.md's literal `{agent_id, stream_offset}` — set when the requested
/// offset fell outside the retained replay window (open question, §9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachPayload {
    pub agent_id: String,
    pub stream_offset: u64,
    #[serde(default)]
    pub truncated: bool,
}

/// `host.stop` response payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopPayload {
    pub stopped: bool,
    pub exit_code: Option<i32>,
    pub graceful: bool,
    pub duration_ms: u64,
    pub final_state: String,
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
