// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! A small framed-request/response client (SPEC_FULL.md supplemental
//! feature: "mirrors the teacher's `protocol::{read_request,
//! write_response}` free functions, packaged as a small struct so
//! `fab-daemon`'s own tests ... don't hand-roll framing").

use crate::error::ProtoError;
use crate::request::{Command, Request};
use crate::response::Response;
use crate::wire::{decode, read_message, read_response, write_request};
use fab_core::StreamEvent;
use std::path::Path;
use tokio::net::UnixStream;

pub struct HostClient {
    stream: UnixStream,
    next_id: u64,
}

impl HostClient {
    pub async fn connect(socket_path: impl AsRef<Path>) -> Result<Self, ProtoError> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self { stream, next_id: 0 })
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream, next_id: 0 }
    }

    /// Send `command` with a freshly minted request id and wait for the
    /// matching response.
    pub async fn call(&mut self, command: Command) -> Result<Response, ProtoError> {
        self.next_id += 1;
        let request = Request::new(self.next_id.to_string(), command);
        write_request(&mut self.stream, &request).await?;
        read_response(&mut self.stream).await
    }

    pub async fn ping(&mut self) -> Result<Response, ProtoError> {
        self.call(Command::Ping).await
    }

    pub async fn status(&mut self) -> Result<Response, ProtoError> {
        self.call(Command::Status).await
    }

    pub async fn list(&mut self) -> Result<Response, ProtoError> {
        self.call(Command::List).await
    }

    pub async fn attach(&mut self, offset: u64) -> Result<Response, ProtoError> {
        self.call(Command::Attach { offset }).await
    }

    pub async fn detach(&mut self) -> Result<Response, ProtoError> {
        self.call(Command::Detach).await
    }

    pub async fn send(&mut self, input: impl Into<String>) -> Result<Response, ProtoError> {
        self.call(Command::Send { input: input.into() }).await
    }

    pub async fn stop(
        &mut self,
        force: bool,
        timeout: u64,
        reason: impl Into<String>,
    ) -> Result<Response, ProtoError> {
        self.call(Command::Stop { force, timeout, reason: reason.into() }).await
    }

    /// After `host.attach`, read the next live-broadcast [`StreamEvent`] off
    /// the same connection. Returns `None` on a clean close.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, ProtoError> {
        match read_message(&mut self.stream).await? {
            Some(body) => Ok(Some(decode(&body)?)),
            None => Ok(None),
        }
    }
}
