// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! `IssueBackend` contract (spec.md §4.3).
//!
//! This crate specifies only the interface; concrete adapters (GitHub
//! Issues, Linear, beads, ...) are a `fab-daemon` concern and out of scope
//! here (spec.md §1 "only the `IssueBackend` interface is specified").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Closed,
    Blocked,
}

crate::simple_display! {
    IssueStatus {
        Open => "open",
        Closed => "closed",
        Blocked => "blocked",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    /// Ids of issues that must be closed before this one is ready.
    #[serde(default)]
    pub blocked_by: Vec<String>,
}

impl Issue {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: IssueStatus::Open,
            blocked_by: Vec::new(),
        }
    }
}

/// Opaque error from an issue backend implementation.
#[derive(Debug)]
pub struct IssueBackendError(Box<dyn std::error::Error + Send + Sync>);

impl IssueBackendError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    pub fn from_message(msg: impl Into<String>) -> Self {
        #[derive(Debug)]
        struct Msg(String);
        impl fmt::Display for Msg {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
        impl std::error::Error for Msg {}
        Self(Box::new(Msg(msg.into())))
    }
}

impl fmt::Display for IssueBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issue backend error: {}", self.0)
    }
}

impl std::error::Error for IssueBackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Pluggable issue tracker consumed by the orchestrator (spec.md §4.3).
///
/// Implementations live outside this crate; `fab-core` only depends on
/// the trait so the orchestrator can poll arbitrary trackers uniformly.
#[async_trait]
pub trait IssueBackend: Send + Sync {
    /// Issues with no open blocking dependencies.
    async fn ready(&self) -> Result<Vec<Issue>, IssueBackendError>;
    async fn list(&self) -> Result<Vec<Issue>, IssueBackendError>;
    async fn get(&self, id: &str) -> Result<Issue, IssueBackendError>;
    async fn create(&self, title: &str, description: &str) -> Result<Issue, IssueBackendError>;
    async fn update(&self, issue: &Issue) -> Result<Issue, IssueBackendError>;
    async fn close(&self, id: &str) -> Result<(), IssueBackendError>;
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
