//! Wire payloads exchanged with the chat server.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A chat room as served by `/api/rooms`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Chat,
    Join,
    Leave,
}

/// Message delivered on a room topic (or `/topic/public`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    /// Server timestamp in epoch millis; the server writes `0` when it never
    /// stamped the message.
    #[must_use]
    pub fn sent_at(&self) -> Option<i64> {
        self.timestamp.filter(|ts| *ts > 0)
    }
}

/// Body of a JOIN or CHAT frame sent to `/app/chat.*`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage<'a> {
    pub sender: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(rename = "type")]
    pub kind: MessageType,
}

impl<'a> OutboundMessage<'a> {
    #[must_use]
    pub fn join(sender: &'a str) -> Self {
        Self {
            sender,
            content: None,
            kind: MessageType::Join,
        }
    }

    #[must_use]
    pub fn chat(sender: &'a str, content: &'a str) -> Self {
        Self {
            sender,
            content: Some(content),
            kind: MessageType::Chat,
        }
    }
}

/// Online users as pushed on `/topic/users`. Each push replaces the last.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub users: BTreeSet<String>,
}

/// Direct message between two users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub recipient: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
