use super::*;
use serde_json::{Map, Value, json};

// =============================================================
// Helpers
// =============================================================

fn doc(id: &str, fields: Value) -> Document {
    let Value::Object(map) = fields else {
        panic!("fields must be an object");
    };
    Document::new(id, map)
}

// =============================================================
// User
// =============================================================

#[test]
fn user_from_document_reads_camel_case_fields() {
    let user = User::from_document(&doc(
        "u1",
        json!({"name": "Alice", "isOnline": true, "lastActive": 1_700_000_000_000_i64, "avatar": "#FF9800"}),
    ))
    .unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.name, "Alice");
    assert!(user.is_online);
    assert_eq!(user.last_active, Some(1_700_000_000_000));
    assert_eq!(user.avatar.as_deref(), Some("#FF9800"));
}

#[test]
fn user_missing_optional_fields_default() {
    let user = User::from_document(&doc("u2", json!({"name": "Bob"}))).unwrap();
    assert!(!user.is_online);
    assert_eq!(user.last_active, None);
    assert_eq!(user.avatar, None);
}

#[test]
fn user_null_last_active_is_none() {
    let user = User::from_document(&doc("u3", json!({"name": "Cy", "lastActive": null}))).unwrap();
    assert_eq!(user.last_active, None);
}

#[test]
fn user_without_name_is_an_error() {
    assert!(User::from_document(&doc("u4", json!({"isOnline": true}))).is_err());
}

#[test]
fn user_document_id_overrides_stored_id_field() {
    let user = User::from_document(&doc("real", json!({"id": "stale", "name": "Dee"}))).unwrap();
    assert_eq!(user.id, "real");
}

#[test]
fn user_serializes_for_session_storage() {
    let user = User {
        id: "u1".to_owned(),
        name: "Alice".to_owned(),
        is_online: true,
        last_active: None,
        avatar: Some("#FF9800".to_owned()),
    };
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["isOnline"], json!(true));
    assert!(value.get("lastActive").is_none());
    let back: User = serde_json::from_value(value).unwrap();
    assert_eq!(back, user);
}

// =============================================================
// Message
// =============================================================

#[test]
fn message_from_document_reads_all_fields() {
    let message = Message::from_document(&doc(
        "m1",
        json!({"text": "hi", "sender": "Alice", "receiver": "Bob", "timestamp": 42, "isPrivate": true}),
    ))
    .unwrap();
    assert_eq!(message.id, "m1");
    assert_eq!(message.text, "hi");
    assert_eq!(message.sender, "Alice");
    assert_eq!(message.receiver, "Bob");
    assert_eq!(message.timestamp, 42);
    assert!(message.is_private);
}

#[test]
fn message_pending_timestamp_reads_as_now() {
    let before = now_millis();
    let message = Message::from_document(&doc(
        "m2",
        json!({"text": "x", "sender": "A", "receiver": PUBLIC_RECEIVER, "timestamp": null}),
    ))
    .unwrap();
    assert!(message.timestamp >= before);
    assert!(!message.is_private);
}

#[test]
fn message_missing_timestamp_reads_as_now() {
    let before = now_millis();
    let message = Message::from_document(&doc("m3", json!({"text": "x", "sender": "A", "receiver": "B"}))).unwrap();
    assert!(message.timestamp >= before);
}

#[test]
fn message_float_timestamp_is_truncated() {
    let message = Message::from_document(&doc(
        "m4",
        json!({"text": "x", "sender": "A", "receiver": "B", "timestamp": 1500.9}),
    ))
    .unwrap();
    assert_eq!(message.timestamp, 1500);
}

#[test]
fn message_string_timestamp_is_an_error() {
    let result = Message::from_document(&doc(
        "m5",
        json!({"text": "x", "sender": "A", "receiver": "B", "timestamp": "yesterday"}),
    ));
    assert!(result.is_err());
}

#[test]
fn message_without_text_is_an_error() {
    let result = Message::from_document(&Document::new("m6", Map::new()));
    assert!(result.is_err());
}
