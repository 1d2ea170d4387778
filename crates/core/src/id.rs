// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Short hex ID generation.
//!
//! Agent IDs are 6 hex characters generated from 3 random bytes (spec.md
//! §4.5: "Generates fresh short hex ids (3 random bytes → 6 hex chars)").

use rand::RngCore;

/// Generate a 6-character lowercase hex ID from 3 random bytes.
pub fn new_short_hex() -> String {
    let mut bytes = [0u8; 3];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
