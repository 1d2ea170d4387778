// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;
use crate::chat::{ChatEntry, ChatRole};

#[test]
fn system_line_parses() {
    let line: AssistantLine = serde_json::from_str(r#"{"type":"system","subtype":"init"}"#).unwrap();
    assert_eq!(line, AssistantLine::System { subtype: "init".to_string() });
}

#[test]
fn assistant_message_with_text_block_parses() {
    let raw = r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"hi"}],"model":"claude","usage":{"input_tokens":1,"output_tokens":2}}}"#;
    let line: AssistantLine = serde_json::from_str(raw).unwrap();
    match line {
        AssistantLine::Assistant { message } => {
            assert_eq!(message.role, "assistant");
            assert_eq!(message.model.as_deref(), Some("claude"));
            assert_eq!(message.usage.unwrap().output_tokens, 2);
            match &message.content[0] {
                ContentBlock::Text { text } => assert_eq!(text, "hi"),
                other => panic!("unexpected block: {other:?}"),
            }
        }
        other => panic!("unexpected line: {other:?}"),
    }
}

#[test]
fn result_line_defaults_is_error_to_false() {
    let line: AssistantLine = serde_json::from_str(r#"{"type":"result","result":"done"}"#).unwrap();
    assert_eq!(line, AssistantLine::Result { result: "done".to_string(), is_error: false });
}

#[test]
fn tool_use_block_carries_arbitrary_json_input() {
    let raw = r#"{"type":"tool_use","id":"t1","name":"bash","input":{"command":"ls"}}"#;
    let block: ContentBlock = serde_json::from_str(raw).unwrap();
    match block {
        ContentBlock::ToolUse { id, name, input } => {
            assert_eq!(id, "t1");
            assert_eq!(name, "bash");
            assert_eq!(input["command"], "ls");
        }
        other => panic!("unexpected block: {other:?}"),
    }
}

#[test]
fn tool_result_content_accepts_plain_string() {
    let raw = r#"{"type":"tool_result","tool_use_id":"t1","content":"ok"}"#;
    let block: ContentBlock = serde_json::from_str(raw).unwrap();
    match block {
        ContentBlock::ToolResult { content, is_error, .. } => {
            assert_eq!(content.0, "ok");
            assert!(!is_error);
        }
        other => panic!("unexpected block: {other:?}"),
    }
}

#[test]
fn tool_result_content_accepts_array_of_text_parts_joined_by_newline() {
    let raw = r#"{"type":"tool_result","tool_use_id":"t1","content":[{"type":"text","text":"a"},{"type":"text","text":"b"}],"is_error":true}"#;
    let block: ContentBlock = serde_json::from_str(raw).unwrap();
    match block {
        ContentBlock::ToolResult { content, is_error, .. } => {
            assert_eq!(content.0, "a\nb");
            assert!(is_error);
        }
        other => panic!("unexpected block: {other:?}"),
    }
}

#[test]
fn input_submission_serializes_with_fixed_type_and_role() {
    let submission = InputSubmission::new("session-1", "go do it");
    let value = serde_json::to_value(&submission).unwrap();
    assert_eq!(value["type"], "user");
    assert_eq!(value["message"]["role"], "user");
    assert_eq!(value["message"]["content"], "go do it");
    assert_eq!(value["session_id"], "session-1");
    assert!(value["parent_tool_use_id"].is_null());
}

#[test]
fn stream_event_kind_display_matches_spec_vocabulary() {
    assert_eq!(StreamEventKind::Output.to_string(), "output");
    assert_eq!(StreamEventKind::ChatEntry.to_string(), "chat_entry");
}

#[test]
fn stream_event_chat_variant_carries_the_entry() {
    let entry = ChatEntry::new(ChatRole::Assistant, "hello", 1);
    let event = StreamEvent::chat("abc123", 1, "2026-01-01T00:00:00Z".to_string(), entry.clone());
    assert_eq!(event.chat_entry, Some(entry));
    assert!(event.data.is_none());
}

#[test]
fn stream_event_round_trips_through_json() {
    let event = StreamEvent::error("abc123", 5, "2026-01-01T00:00:00Z".to_string(), "boom".to_string());
    let json = serde_json::to_string(&event).unwrap();
    let back: StreamEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(event, back);
}
