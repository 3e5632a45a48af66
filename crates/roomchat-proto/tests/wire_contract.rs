//! Wire contract tests.
//!
//! Event names and payload field names are a contract with servers written
//! in other languages. These tests pin the exact JSON shapes and check that
//! payloads from servers that predate the optional fields still decode.

use chrono::DateTime;
use proptest::prelude::*;
use roomchat_proto::{
    ClientMessage, JoinRoom, LeaveRoom, Presence, ReceiveMessage, RoomJoined, SendMessage,
    ServerMessage, codec,
};

#[test]
fn join_room_shape() {
    let message = ClientMessage::JoinRoom(JoinRoom {
        room: "admin".into(),
        username: "bob".into(),
        password: Some("hunter2".into()),
        request_id: Some(3),
    });

    insta::assert_snapshot!(
        codec::encode(&message).unwrap(),
        @r#"{"event":"join_room","data":{"room":"admin","username":"bob","password":"hunter2","request_id":3}}"#
    );
}

#[test]
fn join_room_omits_absent_password() {
    let message = ClientMessage::JoinRoom(JoinRoom {
        room: "general".into(),
        username: "alice".into(),
        password: None,
        request_id: Some(1),
    });

    let json: serde_json::Value = serde_json::from_str(&codec::encode(&message).unwrap()).unwrap();
    assert_eq!(json["event"], "join_room");
    assert!(json["data"].get("password").is_none());
}

#[test]
fn send_message_shape() {
    let message =
        ClientMessage::SendMessage(SendMessage { message: "hi".into(), room: "general".into() });

    insta::assert_snapshot!(
        codec::encode(&message).unwrap(),
        @r#"{"event":"send_message","data":{"message":"hi","room":"general"}}"#
    );
}

#[test]
fn leave_room_shape() {
    let message = ClientMessage::LeaveRoom(LeaveRoom { room: "music".into() });

    insta::assert_snapshot!(
        codec::encode(&message).unwrap(),
        @r#"{"event":"leave_room","data":{"room":"music"}}"#
    );
}

#[test]
fn error_carries_plain_string() {
    let decoded: ServerMessage =
        codec::decode(r#"{"event":"error","data":"Invalid password"}"#).unwrap();
    assert_eq!(decoded, ServerMessage::Error("Invalid password".into()));
}

#[test]
fn receive_message_accepts_iso_and_millis() {
    let iso: ServerMessage = codec::decode(
        r#"{"event":"receive_message","data":{"author":"alice","message":"hi","timestamp":"2024-05-01T10:00:00.000Z"}}"#,
    )
    .unwrap();
    let millis: ServerMessage = codec::decode(
        r#"{"event":"receive_message","data":{"author":"alice","message":"hi","timestamp":1714557600000}}"#,
    )
    .unwrap();

    assert_eq!(iso, millis);
    let ServerMessage::ReceiveMessage(ReceiveMessage { author, message, .. }) = iso else {
        panic!("expected receive_message, got {iso:?}");
    };
    assert_eq!(author, "alice");
    assert_eq!(message, "hi");
}

#[test]
fn presence_events_share_payload() {
    let joined: ServerMessage = codec::decode(
        r#"{"event":"user_joined","data":{"username":"carol","timestamp":0}}"#,
    )
    .unwrap();
    let left: ServerMessage =
        codec::decode(r#"{"event":"user_left","data":{"username":"carol","timestamp":0}}"#)
            .unwrap();

    let presence = Presence {
        username: "carol".into(),
        timestamp: DateTime::from_timestamp_millis(0).unwrap(),
    };
    assert_eq!(joined, ServerMessage::UserJoined(presence.clone()));
    assert_eq!(left, ServerMessage::UserLeft(presence));
}

#[test]
fn room_joined_without_request_id_decodes() {
    let decoded: ServerMessage = codec::decode(
        r#"{"event":"room_joined","data":{"room":"general","username":"alice"}}"#,
    )
    .unwrap();

    assert_eq!(
        decoded,
        ServerMessage::RoomJoined(RoomJoined {
            room: "general".into(),
            username: "alice".into(),
            request_id: None,
        })
    );
}

#[test]
fn event_names_match_serialized_tags() {
    let messages = [
        ClientMessage::JoinRoom(JoinRoom {
            room: "r".into(),
            username: "u".into(),
            password: None,
            request_id: None,
        }),
        ClientMessage::SendMessage(SendMessage { message: "m".into(), room: "r".into() }),
        ClientMessage::LeaveRoom(LeaveRoom { room: "r".into() }),
    ];

    for message in messages {
        let json: serde_json::Value =
            serde_json::from_str(&codec::encode(&message).unwrap()).unwrap();
        assert_eq!(json["event"], message.event_name());
        assert_eq!(message.room(), "r");
    }
}

proptest! {
    /// Arbitrary user text (quotes, newlines, unicode) survives line framing
    /// intact and never breaks the one-message-per-line rule.
    #[test]
    fn prop_message_text_survives_line_framing(text in ".{0,256}", room in "[a-z]{1,12}") {
        let message = ClientMessage::SendMessage(SendMessage { message: text, room });
        let line = codec::encode_line(&message).unwrap();

        prop_assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);

        let mut buffer = codec::LineBuffer::new();
        buffer.extend(&line).unwrap();
        let decoded: ClientMessage = buffer.next_message().unwrap().unwrap();
        prop_assert_eq!(decoded, message);
    }
}
