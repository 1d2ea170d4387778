// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Wire-level error taxonomy (spec.md §7 "External errors", §4.4).

use thiserror::Error;

/// Largest single framed message this codec will decode (spec.md has no
/// stated bound; this guards against a corrupt or hostile length prefix
/// before an allocation is attempted).
pub const MAX_MESSAGE_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("framed message of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    MessageTooLarge { len: u32 },
}
