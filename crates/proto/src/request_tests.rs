// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;

#[test]
fn ping_round_trips_through_json() {
    let request = Request::new("1", Command::Ping);
    let json = serde_json::to_string(&request).expect("serialize failed");
    assert_eq!(json, r#"{"id":"1","type":"host.ping"}"#);
    let decoded: Request = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(decoded, request);
}

#[test]
fn attach_wire_shape_matches_the_documented_envelope() {
    let request = Request::new("7", Command::Attach { offset: 40 });
    let json = serde_json::to_string(&request).expect("serialize failed");
    assert_eq!(json, r#"{"id":"7","type":"host.attach","payload":{"offset":40}}"#);
}

#[test]
fn send_round_trips() {
    let request = Request::new("2", Command::Send { input: "hello".to_string() });
    let json = serde_json::to_string(&request).expect("serialize failed");
    let decoded: Request = serde_json::from_str(&json).expect("deserialize failed");
    match decoded.command {
        Command::Send { input } => assert_eq!(input, "hello"),
        other => panic!("expected Send, got {other:?}"),
    }
}

#[test]
fn stop_fields_default_when_omitted() {
    let json = r#"{"id":"3","type":"host.stop"}"#;
    let decoded: Request = serde_json::from_str(json).expect("deserialize failed");
    match decoded.command {
        Command::Stop { force, timeout, reason } => {
            assert!(!force);
            assert_eq!(timeout, 0);
            assert_eq!(reason, "");
        }
        other => panic!("expected Stop, got {other:?}"),
    }
}

#[test]
fn type_name_matches_the_wire_tag() {
    assert_eq!(Command::Ping.type_name(), "host.ping");
    assert_eq!(Command::Attach { offset: 0 }.type_name(), "host.attach");
    assert_eq!(Command::Stop { force: true, timeout: 5, reason: String::new() }.type_name(), "host.stop");
}
