// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Wire types for the assistant's line-delimited JSON stdout (spec.md §6
//! "Assistant stream protocol") and the core's internal stream-event model
//! broadcast by the agent-host server (spec.md §3 "Stream event", §4.4).

use serde::{Deserialize, Deserializer, Serialize};

/// One parsed line of the assistant's stdout (spec.md §6).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantLine {
    System {
        subtype: String,
    },
    Assistant {
        message: AssistantMessage,
    },
    User {
        message: AssistantMessage,
    },
    Result {
        result: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// A single `{"type":"assistant"|"user","message":{...}}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

/// `ContentBlock` variants (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: FlexContent,
        #[serde(default)]
        is_error: bool,
    },
}

/// Tool-result content that accepts either a bare string or an array of
/// `{"type":"text","text":str}` parts, joined by `\n` (spec.md §6: "MUST
/// accept both the string form and the array-of-text-parts form").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlexContent(pub String);

impl<'de> Deserialize<'de> for FlexContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Plain(String),
            Parts(Vec<TextPart>),
        }
        #[derive(Deserialize)]
        struct TextPart {
            #[serde(rename = "type")]
            #[allow(dead_code)]
            kind: Option<String>,
            text: String,
        }

        match Repr::deserialize(deserializer)? {
            Repr::Plain(s) => Ok(FlexContent(s)),
            Repr::Parts(parts) => {
                Ok(FlexContent(parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join("\n")))
            }
        }
    }
}

impl From<FlexContent> for String {
    fn from(value: FlexContent) -> Self {
        value.0
    }
}

impl std::fmt::Display for FlexContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One user-turn line written to the assistant's stdin (spec.md §6 "Input
/// submission").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSubmission {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: InputMessage,
    pub session_id: String,
    pub parent_tool_use_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputMessage {
    pub role: &'static str,
    pub content: String,
}

impl InputSubmission {
    pub fn new(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: "user",
            message: InputMessage { role: "user", content: content.into() },
            session_id: session_id.into(),
            parent_tool_use_id: None,
        }
    }
}

/// Kind of a [`StreamEvent`] broadcast to attached RPC clients (spec.md §3
/// "Stream event").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventKind {
    Output,
    State,
    ChatEntry,
    Error,
}

crate::simple_display! {
    StreamEventKind {
        Output => "output",
        State => "state",
        ChatEntry => "chat_entry",
        Error => "error",
    }
}

/// Per-agent broadcast event with a strictly-increasing offset (spec.md §3
/// invariant (v), §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: StreamEventKind,
    pub agent_id: String,
    pub offset: u64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_entry: Option<crate::chat::ChatEntry>,
}

impl StreamEvent {
    pub fn output(agent_id: impl Into<String>, offset: u64, timestamp: String, data: String) -> Self {
        Self {
            kind: StreamEventKind::Output,
            agent_id: agent_id.into(),
            offset,
            timestamp,
            data: Some(data),
            state: None,
            error: None,
            chat_entry: None,
        }
    }

    pub fn state(agent_id: impl Into<String>, offset: u64, timestamp: String, state: String) -> Self {
        Self {
            kind: StreamEventKind::State,
            agent_id: agent_id.into(),
            offset,
            timestamp,
            data: None,
            state: Some(state),
            error: None,
            chat_entry: None,
        }
    }

    pub fn chat(
        agent_id: impl Into<String>,
        offset: u64,
        timestamp: String,
        entry: crate::chat::ChatEntry,
    ) -> Self {
        Self {
            kind: StreamEventKind::ChatEntry,
            agent_id: agent_id.into(),
            offset,
            timestamp,
            data: None,
            state: None,
            error: None,
            chat_entry: Some(entry),
        }
    }

    pub fn error(agent_id: impl Into<String>, offset: u64, timestamp: String, error: String) -> Self {
        Self {
            kind: StreamEventKind::Error,
            agent_id: agent_id.into(),
            offset,
            timestamp,
            data: None,
            state: None,
            error: Some(error),
            chat_entry: None,
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
