// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The host RPC request envelope (spec.md §4.4 "Request/response envelope",
//! §6 "Host RPC wire format").

use serde::{Deserialize, Serialize};

/// One RPC call to a per-agent host server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: String,
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    pub fn new(id: impl Into<String>, command: Command) -> Self {
        Self { id: id.into(), command }
    }
}

/// `host.*` command set (spec.md §6 table). Adjacently tagged so the wire
/// shape is `{"type":"host.attach","payload":{"offset":5}}`, matching the
/// envelope's documented `{type, id, payload}` shape once `id` is flattened
/// in alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    #[serde(rename = "host.ping")]
    Ping,

    #[serde(rename = "host.status")]
    Status,

    #[serde(rename = "host.list")]
    List,

    #[serde(rename = "host.attach")]
    Attach { offset: u64 },

    #[serde(rename = "host.detach")]
    Detach,

    #[serde(rename = "host.send")]
    Send { input: String },

    #[serde(rename = "host.stop")]
    Stop {
        #[serde(default)]
        force: bool,
        #[serde(default)]
        timeout: u64,
        #[serde(default)]
        reason: String,
    },
}

impl Command {
    /// The wire `type` string, for logging/correlation without round-tripping
    /// through JSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::Ping => "host.ping",
            Command::Status => "host.status",
            Command::List => "host.list",
            Command::Attach { .. } => "host.attach",
            Command::Detach => "host.detach",
            Command::Send { .. } => "host.send",
            Command::Stop { .. } => "host.stop",
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
