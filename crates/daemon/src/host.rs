// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! The per-agent host RPC server (spec.md §4.4 "Agent-host RPC server").
//!
//! One Unix socket per agent. [`HostServer::build`] constructs the event
//! ring and broadcast channel and hands back [`Callbacks`] that feed both —
//! these get merged into the [`AgentManager`]'s own callbacks via
//! [`Callbacks::chain`] *before* the agent is constructed, so no event is
//! lost between `Agent::new` and the listener coming up. [`HostServer::serve`]
//! then binds the socket and runs the accept loop.

use crate::error::HostError;
use crate::manager::AgentManager;
use chrono::{SecondsFormat, Utc};
use fab_agent::{Agent, Callbacks};
use fab_core::{AgentId, Clock, StreamEvent};
use fab_proto::{
    AgentInfo, AttachPayload, Command, EventRing, HostInfo, ListPayload, PingPayload, Request,
    Response, StatusPayload, StopPayload, DEFAULT_EVENT_RING_CAPACITY, PROTOCOL_VERSION,
};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

/// A per-agent RPC server: event ring + broadcast fan-out + a listening
/// Unix socket (spec.md §4.4 "Transport": "one socket per agent").
pub struct HostServer {
    agent_id: AgentId,
    socket_path: PathBuf,
    backend: String,
    started_at_ms: u64,
    ring: Arc<EventRing>,
    tx: broadcast::Sender<StreamEvent>,
}

impl HostServer {
    /// Phase 1: build the ring and broadcast channel, and derive the
    /// [`Callbacks`] that push every agent lifecycle event into them. Call
    /// this *before* `Agent::new`, chain the returned callbacks into the
    /// manager's own, then call [`HostServer::serve`] once the `Agent` and
    /// [`AgentManager`] handles exist.
    pub fn build(
        agent_id: AgentId,
        socket_path: PathBuf,
        backend: impl Into<String>,
        started_at_ms: u64,
    ) -> (Arc<HostServer>, Callbacks) {
        let (tx, _rx) = broadcast::channel(DEFAULT_EVENT_RING_CAPACITY);
        let server = Arc::new(HostServer {
            agent_id,
            socket_path,
            backend: backend.into(),
            started_at_ms,
            ring: Arc::new(EventRing::new(DEFAULT_EVENT_RING_CAPACITY)),
            tx,
        });
        let callbacks = server.broadcast_callbacks();
        (server, callbacks)
    }

    fn broadcast_callbacks(self: &Arc<Self>) -> Callbacks {
        let ring = Arc::clone(&self.ring);
        let tx = self.tx.clone();
        let id = self.agent_id.as_str().to_string();
        let on_output: fab_agent::OutputCallback = {
            let ring = Arc::clone(&ring);
            let tx = tx.clone();
            let id = id.clone();
            Arc::new(move |line: &str| {
                let event = ring.push(|offset| StreamEvent::output(id.clone(), offset, timestamp_now(), line.to_string()));
                let _ = tx.send(event);
            })
        };
        let on_error: fab_agent::ErrorCallback = {
            let ring = Arc::clone(&ring);
            let tx = tx.clone();
            let id = id.clone();
            Arc::new(move |msg: &str| {
                let event = ring.push(|offset| StreamEvent::error(id.clone(), offset, timestamp_now(), msg.to_string()));
                let _ = tx.send(event);
            })
        };
        let on_state_change: fab_agent::StateChangeCallback = {
            let ring = Arc::clone(&ring);
            let tx = tx.clone();
            let id = id.clone();
            Arc::new(move |_old, new| {
                let event = ring.push(|offset| StreamEvent::state(id.clone(), offset, timestamp_now(), new.to_string()));
                let _ = tx.send(event);
            })
        };
        let on_entry: fab_agent::EntryCallback = {
            let tx = tx.clone();
            let id = id.clone();
            Arc::new(move |entry: &fab_core::ChatEntry| {
                let event = ring.push(|offset| StreamEvent::chat(id.clone(), offset, timestamp_now(), entry.clone()));
                let _ = tx.send(event);
            })
        };

        Callbacks {
            on_entry: Some(on_entry),
            on_output: Some(on_output),
            on_error: Some(on_error),
            on_state_change: Some(on_state_change),
            on_done: None,
        }
    }

    /// Phase 2: bind the Unix socket and spawn the accept loop (spec.md
    /// §4.4 "Transport": "parent dir 0700, socket file 0600").
    pub async fn serve<C: Clock + 'static>(
        self: Arc<Self>,
        agent: Arc<Agent<C>>,
        manager: Arc<AgentManager<C>>,
    ) -> Result<(), HostError> {
        if let Some(parent) = self.socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
            tokio::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700)).await?;
        }
        let _ = tokio::fs::remove_file(&self.socket_path).await;
        let listener = UnixListener::bind(&self.socket_path)?;
        tokio::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600)).await?;

        info!(agent_id = %self.agent_id.as_str(), socket = %self.socket_path.display(), "host server listening");
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let server = Arc::clone(&self);
                    let agent = Arc::clone(&agent);
                    let manager = Arc::clone(&manager);
                    tokio::spawn(async move {
                        if let Err(err) = server.handle_connection(stream, agent, manager).await {
                            debug!(agent_id = %server.agent_id.as_str(), error = %err, "connection ended");
                        }
                    });
                }
                Err(err) => {
                    error!(agent_id = %self.agent_id.as_str(), error = %err, "accept failed");
                }
            }
        }
    }

    async fn handle_connection<C: Clock + 'static>(
        self: Arc<Self>,
        stream: UnixStream,
        agent: Arc<Agent<C>>,
        manager: Arc<AgentManager<C>>,
    ) -> Result<(), HostError> {
        let (mut reader, writer) = stream.into_split();
        let writer = Arc::new(AsyncMutex::new(writer));

        loop {
            let request = match fab_proto::read_request(&mut reader).await {
                Ok(request) => request,
                Err(fab_proto::ProtoError::ConnectionClosed) => return Ok(()),
                Err(err) => return Err(err.into()),
            };
            debug!(agent_id = %self.agent_id.as_str(), command = request.command.type_name(), "request");

            if let Command::Attach { offset } = &request.command {
                let offset = *offset;
                return self.handle_attach(&request.id, offset, reader, writer, &agent).await;
            }

            let response = self.dispatch(&request, &agent, &manager).await;
            self.write_response(&writer, &response).await;

            if matches!(request.command, Command::Stop { .. }) {
                return Ok(());
            }
        }
    }

    async fn dispatch<C: Clock + 'static>(
        &self,
        request: &Request,
        agent: &Arc<Agent<C>>,
        manager: &Arc<AgentManager<C>>,
    ) -> Response {
        let type_name = request.command.type_name();
        let result = match &request.command {
            Command::Ping => Response::ok(&request.id, type_name, self.ping_payload()),
            Command::Status => Response::ok(&request.id, type_name, self.status_payload(agent).await),
            Command::List => Response::ok(&request.id, type_name, self.list_payload(agent).await),
            Command::Detach => Ok(Response::ok_empty(&request.id, type_name)),
            Command::Send { input } => match agent.send_message(input).await {
                Ok(()) => Ok(Response::ok_empty(&request.id, type_name)),
                Err(err) => return Response::err(&request.id, type_name, err),
            },
            Command::Stop { timeout, .. } => {
                return self.handle_stop(&request.id, *timeout, agent, manager).await;
            }
            Command::Attach { .. } => unreachable!("handled by caller before dispatch"),
        };
        result.unwrap_or_else(|err: serde_json::Error| Response::err(&request.id, type_name, err))
    }

    fn ping_payload(&self) -> PingPayload {
        PingPayload {
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            uptime_secs: uptime_secs(self.started_at_ms),
            started_at: epoch_ms_to_rfc3339(self.started_at_ms),
        }
    }

    async fn status_payload<C: Clock + 'static>(&self, agent: &Arc<Agent<C>>) -> StatusPayload {
        StatusPayload {
            host: HostInfo {
                pid: std::process::id(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                protocol_version: PROTOCOL_VERSION.to_string(),
                started_at: epoch_ms_to_rfc3339(self.started_at_ms),
                socket_path: self.socket_path.display().to_string(),
            },
            agent: self.agent_info(agent).await,
        }
    }

    /// Scoped to the single agent this socket is bound to — spec.md's
    /// transport model is one socket per agent, so `host.list` here lists
    /// the one agent rather than the whole fleet.
    async fn list_payload<C: Clock + 'static>(&self, agent: &Arc<Agent<C>>) -> ListPayload {
        ListPayload { agents: vec![self.agent_info(agent).await] }
    }

    async fn agent_info<C: Clock + 'static>(&self, agent: &Arc<Agent<C>>) -> AgentInfo {
        AgentInfo {
            id: agent.id.as_str().to_string(),
            project: agent.project.clone(),
            state: agent.state().to_string(),
            pid: agent.pid().await,
            worktree: agent.worktree_path.display().to_string(),
            started_at: epoch_ms_to_rfc3339(agent.created_at_ms),
            task: agent.task_id(),
            description: agent.description(),
            backend: self.backend.clone(),
        }
    }

    /// `host.stop` delegates to `Manager.Stop` (spec.md §4.4: "`host.stop`
    /// invokes `Manager.Stop` on the agent"), then schedules the listener's
    /// own shutdown a short delay later so the response has time to flush.
    async fn handle_stop<C: Clock + 'static>(
        self: &Arc<Self>,
        request_id: &str,
        timeout_secs: u64,
        agent: &Arc<Agent<C>>,
        manager: &Arc<AgentManager<C>>,
    ) -> Response {
        let timeout =
            if timeout_secs == 0 { fab_agent::DEFAULT_STOP_TIMEOUT } else { Duration::from_secs(timeout_secs) };
        let started = std::time::Instant::now();
        let graceful = match manager.stop_with_timeout(agent.id.as_str(), timeout).await {
            Ok(graceful) => graceful,
            Err(err) => return Response::err(request_id, "host.stop", err),
        };
        let payload = StopPayload {
            stopped: true,
            exit_code: agent.exit_code(),
            graceful,
            duration_ms: started.elapsed().as_millis() as u64,
            final_state: agent.state().to_string(),
        };
        let response = Response::ok(request_id, "host.stop", payload)
            .unwrap_or_else(|err| Response::err(request_id, "host.stop", err));

        let server = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(crate::env::host_shutdown_delay()).await;
            let _ = tokio::fs::remove_file(&server.socket_path).await;
        });
        response
    }

    /// `host.attach` is a connection-upgrading request (grounded on the
    /// teacher's documented comment: after the handshake the connection
    /// becomes a bidirectional stream). The socket now carries raw framed
    /// [`StreamEvent`] JSON — matching [`fab_proto::HostClient::next_event`]
    /// — until the client sends `host.detach` or disconnects.
    async fn handle_attach<C: Clock + 'static>(
        &self,
        request_id: &str,
        offset: u64,
        mut reader: OwnedReadHalf,
        writer: Arc<AsyncMutex<OwnedWriteHalf>>,
        _agent: &Arc<Agent<C>>,
    ) -> Result<(), HostError> {
        let (backlog, truncated) = self.ring.replay_since(offset);
        let payload = AttachPayload { agent_id: self.agent_id.as_str().to_string(), stream_offset: offset, truncated };
        let response = Response::ok(request_id, "host.attach", payload)?;
        self.write_response(&writer, &response).await;

        for event in backlog {
            if self.send_event(&writer, &event).await.is_err() {
                return Ok(());
            }
        }

        let mut rx = self.tx.subscribe();
        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Ok(event) => {
                            if self.send_event(&writer, &event).await.is_err() {
                                return Ok(());
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(agent_id = %self.agent_id.as_str(), skipped, "attach client lagged, dropping frames");
                        }
                        Err(broadcast::error::RecvError::Closed) => return Ok(()),
                    }
                }
                request = fab_proto::read_request(&mut reader) => {
                    match request {
                        Ok(request) if matches!(request.command, Command::Detach) => {
                            let response = Response::ok_empty(&request.id, "host.detach");
                            self.write_response(&writer, &response).await;
                            return Ok(());
                        }
                        Ok(_) => continue,
                        Err(_) => return Ok(()),
                    }
                }
            }
        }
    }

    /// Writes under a per-connection mutex with a 100 ms deadline (spec.md
    /// §4.4: "a slow client drops frames, it never stalls the others").
    async fn send_event(&self, writer: &Arc<AsyncMutex<OwnedWriteHalf>>, event: &StreamEvent) -> Result<(), ()> {
        let Ok(body) = fab_proto::encode(event) else { return Err(()) };
        self.write_with_deadline(writer, &body).await
    }

    async fn write_response(&self, writer: &Arc<AsyncMutex<OwnedWriteHalf>>, response: &Response) {
        let Ok(body) = fab_proto::encode(response) else { return };
        let _ = self.write_with_deadline(writer, &body).await;
    }

    async fn write_with_deadline(&self, writer: &Arc<AsyncMutex<OwnedWriteHalf>>, body: &[u8]) -> Result<(), ()> {
        let deadline = crate::env::host_write_deadline();
        let mut writer = writer.lock().await;
        let len = body.len() as u32;
        let write = async {
            writer.write_all(&len.to_be_bytes()).await?;
            writer.write_all(body).await?;
            writer.flush().await
        };
        match tokio::time::timeout(deadline, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                warn!(agent_id = %self.agent_id.as_str(), error = %err, "write failed");
                Err(())
            }
            Err(_) => {
                warn!(agent_id = %self.agent_id.as_str(), "write deadline exceeded, dropping frame");
                Err(())
            }
        }
    }
}

fn timestamp_now() -> String {
    epoch_ms_to_rfc3339(now_ms())
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn uptime_secs(started_at_ms: u64) -> u64 {
    now_ms().saturating_sub(started_at_ms) / 1000
}

/// Renders an epoch-millisecond timestamp as RFC 3339, matching the
/// millisecond granularity spec.md §3's `StreamEvent.timestamp` calls for.
fn epoch_ms_to_rfc3339(epoch_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).unwrap())
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
