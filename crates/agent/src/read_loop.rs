// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The background stdout reader (spec.md §4.1 `StartReadLoop`).
//!
//! Parses JSONL lines, appends raw bytes to the ring buffer, converts
//! assistant/user messages into zero or more chat entries, scans recent
//! output for done-patterns, and invokes the agent's callbacks outside any
//! lock. Transient parse errors go to `OnError` and the loop continues;
//! only EOF and cancellation end it.

use crate::agent::Agent;
use crate::config::ReadLoopConfig;
use fab_core::{AgentState, AssistantLine, ChatEntry, ChatRole, Clock, ContentBlock};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio_util::sync::CancellationToken;

pub(crate) async fn run<C: Clock + 'static>(
    agent: Arc<Agent<C>>,
    stdout: ChildStdout,
    config: ReadLoopConfig,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(stdout).lines();
    let mut seen_output = false;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        match next {
            Ok(Some(line)) => {
                if !seen_output {
                    seen_output = true;
                    let _ = agent.mark_running();
                }

                agent.ring_buffer.write(format!("{line}\n").as_bytes());
                if let Some(cb) = &agent.callbacks.on_output {
                    cb(&line);
                }

                match serde_json::from_str::<AssistantLine>(&line) {
                    Ok(parsed) => handle_line(&agent, parsed),
                    Err(err) => {
                        if let Some(cb) = &agent.callbacks.on_error {
                            cb(&err.to_string());
                        }
                    }
                }

                check_done(&agent, config.done_scan_lines);
            }
            Ok(None) => {
                // The transition table only allows `Done` from `Running`/`Idle`;
                // a process that closes stdout before its first line never left
                // `Starting` and goes to `Error` instead.
                if agent.state() == AgentState::Starting {
                    let _ = agent.mark_error();
                } else if agent.is_active() {
                    let _ = agent.mark_done();
                }
                break;
            }
            Err(err) => {
                if let Some(cb) = &agent.callbacks.on_error {
                    cb(&err.to_string());
                }
                break;
            }
        }
    }
}

fn handle_line<C: Clock>(agent: &Agent<C>, line: AssistantLine) {
    let message = match line {
        AssistantLine::Assistant { message } => message,
        AssistantLine::User { message } => message,
        AssistantLine::System { .. } | AssistantLine::Result { .. } => return,
    };

    let role = match message.role.as_str() {
        "user" => ChatRole::User,
        "assistant" => ChatRole::Assistant,
        _ => ChatRole::Tool,
    };

    for block in &message.content {
        let Some(text) = chat_text(block) else { continue };
        let entry = ChatEntry::new(role, text, agent.clock.epoch_ms());
        agent.chat_history.push(entry.clone());
        if let Some(cb) = &agent.callbacks.on_entry {
            cb(&entry);
        }
    }
}

fn chat_text(block: &ContentBlock) -> Option<String> {
    match block {
        ContentBlock::Text { text } => Some(text.clone()),
        ContentBlock::ToolUse { name, .. } => Some(format!("[tool_use: {name}]")),
        ContentBlock::ToolResult { content, is_error, .. } if *is_error => {
            Some(format!("[tool_error] {content}"))
        }
        ContentBlock::ToolResult { content, .. } => Some(content.to_string()),
    }
}

fn check_done<C: Clock>(agent: &Agent<C>, scan_lines: usize) {
    if !agent.is_active() {
        return;
    }
    let Some(detector) = agent.done_detector() else { return };
    let recent = agent.ring_buffer.last_lines(scan_lines);
    if let Some(m) = detector.check_recent(&recent, scan_lines) {
        if agent.mark_done().is_ok() {
            if let Some(cb) = &agent.callbacks.on_done {
                cb(&m.line);
            }
        }
    }
}
