// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;
use std::collections::HashSet;

#[test]
fn new_short_hex_is_six_lowercase_hex_chars() {
    let id = new_short_hex();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn new_short_hex_is_not_constant() {
    let mut seen = HashSet::new();
    for _ in 0..64 {
        seen.insert(new_short_hex());
    }
    // 3 random bytes give 16.7M possibilities; 64 draws should essentially
    // never collide down to a single value.
    assert!(seen.len() > 1);
}
