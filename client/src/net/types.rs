//! User and message records as stored in the remote document database.
//!
//! DESIGN
//! ======
//! Field names mirror the stored documents (`isOnline`, `lastActive`,
//! `isPrivate`) so the same serde derive is used for store documents and for
//! the persisted session identity. Timestamps are milliseconds since the Unix
//! epoch; backends convert their native timestamp type before records reach
//! this module.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::net::store::Document;
use crate::util::clock::now_millis;

/// Collection holding one document per user.
pub const USERS_COLLECTION: &str = "users";
/// Collection holding one document per message.
pub const MESSAGES_COLLECTION: &str = "messages";
/// Receiver name used for public messages.
pub const PUBLIC_RECEIVER: &str = "everyone";

/// A chat participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned document identifier.
    pub id: String,
    /// Display name. Acts as the login key.
    pub name: String,
    /// Whether the user is currently logged in somewhere.
    #[serde(default)]
    pub is_online: bool,
    /// Last status change in milliseconds since the Unix epoch.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_millis"
    )]
    pub last_active: Option<i64>,
    /// Avatar colour (hex) derived from the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Decode a user from a `users` document.
    ///
    /// # Errors
    ///
    /// Returns a serde error when required fields are missing or mistyped.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.to_value())
    }
}

/// A chat message, public or private.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned document identifier.
    pub id: String,
    pub text: String,
    /// Sender display name.
    pub sender: String,
    /// Receiver display name, or [`PUBLIC_RECEIVER`].
    pub receiver: String,
    /// Store timestamp in milliseconds. Pending server timestamps read as now.
    #[serde(default = "now_millis", deserialize_with = "deserialize_millis_or_now")]
    pub timestamp: i64,
    #[serde(default)]
    pub is_private: bool,
}

impl Message {
    /// Decode a message from a `messages` document.
    ///
    /// # Errors
    ///
    /// Returns a serde error when required fields are missing or mistyped.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.to_value())
    }
}

fn deserialize_optional_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(number) => number_to_i64(&number).map(Some).map_err(D::Error::custom),
        _ => Err(D::Error::custom("expected millisecond timestamp")),
    }
}

fn deserialize_millis_or_now<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_millis(deserializer)?.unwrap_or_else(now_millis))
}

fn number_to_i64(number: &serde_json::Number) -> Result<i64, &'static str> {
    if let Some(int) = number.as_i64() {
        return Ok(int);
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    if let Some(float) = number.as_f64()
        && float.is_finite()
        && float >= i64::MIN as f64
        && float <= i64::MAX as f64
    {
        return Ok(float.trunc() as i64);
    }
    Err("expected integer-compatible number")
}
