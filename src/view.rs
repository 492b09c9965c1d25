//! In-memory chat screen: what the user currently sees.
//!
//! DESIGN
//! ======
//! The session mutates [`ChatView`] through narrow methods; each mutation also
//! queues a [`ViewUpdate`] that the terminal printer drains and writes. Tests
//! assert on the view state directly, the binary only on the drained updates.

use std::collections::VecDeque;

use crate::model::{PresenceSnapshot, Room};
use crate::render::{Entry, Rendered};

/// One change to print.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewUpdate {
    Connecting(bool),
    Status(String),
    Rooms {
        rooms: Vec<Room>,
        active: Option<String>,
    },
    RoomHeader(String),
    Cleared,
    Appended(Entry),
    Presence(PresencePanel),
    Alert(String),
    Bell,
}

/// Online count plus every online user except the local one, sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresencePanel {
    pub count: usize,
    pub others: Vec<String>,
}

impl PresencePanel {
    #[must_use]
    pub fn from_snapshot(snapshot: &PresenceSnapshot, me: &str) -> Self {
        Self {
            count: snapshot.count,
            others: snapshot
                .users
                .iter()
                .filter(|user| user.as_str() != me)
                .cloned()
                .collect(),
        }
    }
}

/// Rendered message list, optionally capped to the newest `capacity` entries.
#[derive(Clone, Debug, Default)]
pub struct MessageArea {
    entries: VecDeque<Entry>,
    capacity: Option<usize>,
}

impl MessageArea {
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.filter(|cap| *cap > 0),
        }
    }

    pub fn push(&mut self, entry: Entry) {
        if let Some(cap) = self.capacity {
            while self.entries.len() >= cap {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Entry> {
        self.entries.back()
    }
}

#[derive(Debug, Default)]
pub struct ChatView {
    connecting: bool,
    status: Option<String>,
    room_header: Option<String>,
    rooms: Vec<Room>,
    active_room: Option<String>,
    messages: MessageArea,
    presence: PresencePanel,
    alerts: Vec<String>,
    bell: bool,
    updates: Vec<ViewUpdate>,
}

impl ChatView {
    /// `capacity` caps the retained message list; `None` keeps everything.
    /// `bell` enables the notification tone.
    #[must_use]
    pub fn new(capacity: Option<usize>, bell: bool) -> Self {
        Self {
            messages: MessageArea::new(capacity),
            bell,
            ..Self::default()
        }
    }

    pub fn set_connecting(&mut self, connecting: bool) {
        self.connecting = connecting;
        self.updates.push(ViewUpdate::Connecting(connecting));
    }

    /// Inline status line, e.g. a connection failure.
    pub fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        self.status = Some(status.clone());
        self.updates.push(ViewUpdate::Status(status));
    }

    pub fn set_rooms(&mut self, rooms: &[Room], active: Option<&str>) {
        self.rooms = rooms.to_vec();
        self.active_room = active.map(ToOwned::to_owned);
        self.updates.push(ViewUpdate::Rooms {
            rooms: self.rooms.clone(),
            active: self.active_room.clone(),
        });
    }

    pub fn set_room_header(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.room_header = Some(name.clone());
        self.updates.push(ViewUpdate::RoomHeader(name));
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.updates.push(ViewUpdate::Cleared);
    }

    pub fn push_rendered(&mut self, rendered: Rendered) {
        self.messages.push(rendered.entry.clone());
        self.updates.push(ViewUpdate::Appended(rendered.entry));
        if rendered.notify && self.bell {
            self.updates.push(ViewUpdate::Bell);
        }
    }

    /// Replace the presence panel wholesale.
    pub fn replace_presence(&mut self, snapshot: &PresenceSnapshot, me: &str) {
        self.presence = PresencePanel::from_snapshot(snapshot, me);
        self.updates.push(ViewUpdate::Presence(self.presence.clone()));
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.alerts.push(message.clone());
        self.updates.push(ViewUpdate::Alert(message));
    }

    /// Take every queued update, oldest first.
    pub fn drain_updates(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.updates)
    }

    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn room_header(&self) -> Option<&str> {
        self.room_header.as_deref()
    }

    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub fn active_room(&self) -> Option<&str> {
        self.active_room.as_deref()
    }

    #[must_use]
    pub fn messages(&self) -> &MessageArea {
        &self.messages
    }

    #[must_use]
    pub fn presence(&self) -> &PresencePanel {
        &self.presence
    }

    #[must_use]
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
