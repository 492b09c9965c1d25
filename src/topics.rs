//! STOMP destinations of the chat server.

/// Presence snapshots for every connected client.
pub const PRESENCE_TOPIC: &str = "/topic/users";
/// Per-user queue the server answers failed frames on.
pub const ERROR_QUEUE: &str = "/user/queue/errors";
/// Per-user queue private messages arrive on.
pub const PRIVATE_QUEUE: &str = "/user/queue/message";
/// Where private messages are sent.
pub const PRIVATE_SEND: &str = "/app/chat.private";

/// Room id the session reports while in the single public room.
pub const PUBLIC_ROOM_ID: &str = "public";

/// The conversation a room subscription points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomTarget<'a> {
    /// Single-room server: `/topic/public`.
    Public,
    /// Multi-room server: `/topic/room.{id}`.
    Room(&'a str),
}

impl RoomTarget<'_> {
    #[must_use]
    pub fn topic(self) -> String {
        match self {
            Self::Public => "/topic/public".to_owned(),
            Self::Room(id) => format!("/topic/room.{id}"),
        }
    }

    #[must_use]
    pub fn join_destination(self) -> String {
        match self {
            Self::Public => "/app/chat.addUser".to_owned(),
            Self::Room(id) => format!("/app/chat.addUser/{id}"),
        }
    }

    #[must_use]
    pub fn send_destination(self) -> String {
        match self {
            Self::Public => "/app/chat.sendMessage".to_owned(),
            Self::Room(id) => format!("/app/chat.sendMessage/{id}"),
        }
    }
}

#[cfg(test)]
#[path = "topics_test.rs"]
mod tests;
