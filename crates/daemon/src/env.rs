// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Centralized environment variable access for the daemon crate.

use crate::error::DaemonError;
use std::path::PathBuf;
use std::time::Duration;

/// Resolve the fab state directory: `FAB_STATE_DIR` > `XDG_STATE_HOME`/fab >
/// `~/.local/state/fab` (spec.md §6 "Filesystem layout": `<FAB_DIR>`).
pub fn fab_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("FAB_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fab"));
    }
    let home = std::env::var("HOME").map_err(|_| DaemonError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/fab"))
}

/// `<FAB_DIR>/hosts/` (spec.md §4.4 "Transport").
pub fn hosts_dir(fab_dir: &std::path::Path) -> PathBuf {
    fab_dir.join("hosts")
}

/// Per-client write deadline on the host server's broadcast socket
/// (spec.md §4.4: "100 ms write deadline").
pub fn host_write_deadline() -> Duration {
    std::env::var("FAB_HOST_WRITE_DEADLINE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(100))
}

/// Delay between `host.stop`'s response flushing and the server actually
/// tearing down (spec.md §4.4: "schedules server shutdown ~100 ms later").
pub fn host_shutdown_delay() -> Duration {
    std::env::var("FAB_HOST_SHUTDOWN_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(100))
}

/// How long the supervisor waits for orchestrators and agents to stop
/// during graceful shutdown before it stops waiting (spec.md §4.5
/// "Graceful shutdown").
pub fn shutdown_timeout() -> Duration {
    std::env::var("FAB_SHUTDOWN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}
