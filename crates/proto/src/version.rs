// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Protocol versioning (spec.md §4.4 "Protocol versioning").

/// This build's protocol version, returned by `host.ping`.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Oldest protocol version a client should accept from a host.
pub const MIN_PROTOCOL_VERSION: &str = "0.1.0";

/// Parse a `major.minor.patch` string, ignoring any `-` or `+` suffix.
fn parse(version: &str) -> Option<(u64, u64, u64)> {
    let core = version.split(['-', '+']).next().unwrap_or(version);
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor, patch))
}

/// Is `peer_version` acceptable against [`MIN_PROTOCOL_VERSION`]? Unparseable
/// versions are rejected rather than assumed compatible.
pub fn is_compatible(peer_version: &str) -> bool {
    match (parse(peer_version), parse(MIN_PROTOCOL_VERSION)) {
        (Some(peer), Some(min)) => peer >= min,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_to_minimum_is_compatible() {
        assert!(is_compatible(MIN_PROTOCOL_VERSION));
    }

    #[test]
    fn older_than_minimum_is_rejected() {
        assert!(!is_compatible("0.0.9"));
    }

    #[test]
    fn newer_than_minimum_is_compatible() {
        assert!(is_compatible("9.9.9"));
    }

    #[test]
    fn unparseable_version_is_rejected() {
        assert!(!is_compatible("not-a-version"));
    }
}
