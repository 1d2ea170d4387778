// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Black-box specs for the `fabd` binary (spec.md §1, §4.5, §6).
//!
//! A CLI/TUI front-end and issue-tracker adapters are explicitly out of
//! scope (spec.md §1), so unlike a driven-through-subcommands harness
//! there is no admin surface to poke from the outside. What's left to
//! assert at the binary boundary is the daemon's own lifecycle: it loads
//! a config, registers projects, and shuts down cleanly on a signal.

use assert_cmd::Command;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::time::{Duration, Instant};

const WAIT_MAX: Duration = Duration::from_secs(10);

fn wait_for(mut predicate: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < WAIT_MAX {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

fn git(cwd: &Path, args: &[&str]) {
    let output = std::process::Command::new("git").args(args).current_dir(cwd).output().expect("failed to spawn git");
    assert!(output.status.success(), "git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
}

/// `<base>/origin` bare remote plus `<base>/proj/repo`, the clone a
/// `ProjectConfig` named `"proj"` rooted at `base` would expect to find
/// (spec.md §4.2 "Directory contract").
fn fixture_repo(base: &Path) {
    let origin = base.join("origin");
    let repo = base.join("proj").join("repo");
    std::fs::create_dir_all(&origin).expect("create origin dir");
    std::fs::create_dir_all(repo.parent().expect("repo has a parent")).expect("create project dir");

    git(&origin, &["init", "--bare", "-q"]);
    git(base, &["clone", "-q", origin.to_str().expect("utf8 path"), repo.to_str().expect("utf8 path")]);
    git(&repo, &["config", "user.email", "fab-test@example.com"]);
    git(&repo, &["config", "user.name", "fab test"]);
    git(&repo, &["checkout", "-b", "main"]);
    std::fs::write(repo.join("README.md"), b"hello\n").expect("write readme");
    git(&repo, &["add", "README.md"]);
    git(&repo, &["commit", "-q", "-m", "initial commit"]);
    git(&repo, &["push", "-q", "-u", "origin", "main"]);
}

fn write_config(base: &Path, autostart: bool) -> PathBuf {
    let config_path = base.join("fab.toml");
    let config = format!(
        "[[project]]\nname = \"proj\"\nremote_url = \"unused\"\nbase_dir = {base:?}\nissue_backend = \"\"\nautostart = {autostart}\n",
    );
    std::fs::write(&config_path, config).expect("write config");
    config_path
}

/// Kills the child on drop so a failing assertion never leaves a `fabd`
/// process running past the test.
struct DaemonGuard(Child);

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = signal::kill(Pid::from_raw(self.0.id() as i32), Signal::SIGKILL);
        let _ = self.0.wait();
    }
}

fn spawn_daemon(config_path: &Path) -> DaemonGuard {
    let child = Command::cargo_bin("fabd")
        .expect("fabd binary built")
        .arg("--config")
        .arg(config_path)
        .spawn()
        .expect("spawn fabd");
    DaemonGuard(child)
}

#[test]
fn daemon_starts_and_exits_cleanly_on_sigterm() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fixture_repo(tmp.path());
    let config_path = write_config(tmp.path(), false);

    let mut daemon = spawn_daemon(&config_path);

    // No admin surface to poll readiness through, so give the runtime a
    // fixed grace period to finish registering the project.
    std::thread::sleep(Duration::from_millis(200));
    assert!(daemon.0.try_wait().expect("try_wait").is_none(), "daemon exited before receiving a signal");

    signal::kill(Pid::from_raw(daemon.0.id() as i32), Signal::SIGTERM).expect("send SIGTERM");

    let exited = wait_for(|| daemon.0.try_wait().expect("try_wait").is_some());
    assert!(exited, "daemon did not exit within the wait window after SIGTERM");

    let status = daemon.0.try_wait().expect("try_wait").expect("status available after exit");
    assert!(status.success(), "daemon should exit 0 on graceful shutdown, got {status:?}");
}

#[test]
fn daemon_with_an_autostart_project_also_shuts_down_cleanly() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fixture_repo(tmp.path());
    let config_path = write_config(tmp.path(), true);

    let mut daemon = spawn_daemon(&config_path);
    std::thread::sleep(Duration::from_millis(200));
    assert!(daemon.0.try_wait().expect("try_wait").is_none(), "daemon exited before receiving a signal");

    signal::kill(Pid::from_raw(daemon.0.id() as i32), Signal::SIGINT).expect("send SIGINT");

    let exited = wait_for(|| daemon.0.try_wait().expect("try_wait").is_some());
    assert!(exited, "daemon did not exit within the wait window after SIGINT");
}

#[test]
fn daemon_exits_nonzero_when_config_is_missing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join("missing.toml");

    Command::cargo_bin("fabd").expect("fabd binary built").arg("--config").arg(&missing).assert().failure();
}
