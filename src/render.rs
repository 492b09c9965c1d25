//! Message rendering: decoded payload in, display entry out.
//!
//! Everything here is a pure function of the message, the local username, the
//! display offset and the receive time. Retention and output belong to
//! [`crate::view`] and [`crate::terminal`].

use std::time::{SystemTime, UNIX_EPOCH};

use time::{OffsetDateTime, UtcOffset};

use crate::color::avatar_color;
use crate::model::{ChatMessage, MessageType, PrivateMessage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Join,
    Leave,
}

impl EventKind {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Join => "→",
            Self::Leave => "←",
        }
    }
}

/// JOIN/LEAVE notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLine {
    pub kind: EventKind,
    pub text: String,
    pub time: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatBubble {
    pub sender: String,
    pub initial: String,
    pub color: &'static str,
    pub content: String,
    pub time: String,
    /// Sent by the local user.
    pub own: bool,
}

/// Private message, inbound or echoed outbound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Whisper {
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub time: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Event(EventLine),
    Chat(ChatBubble),
    Whisper(Whisper),
}

/// A rendered entry plus whether it should ring the notification bell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub entry: Entry,
    pub notify: bool,
}

/// Zero-padded 24-hour `HH:MM` of `epoch_millis` at `offset`.
///
/// Instants outside the representable range render as `--:--`.
#[must_use]
pub fn format_time(epoch_millis: i64, offset: UtcOffset) -> String {
    let nanos = i128::from(epoch_millis) * 1_000_000;
    let Ok(utc) = OffsetDateTime::from_unix_timestamp_nanos(nanos) else {
        return "--:--".to_owned();
    };
    match utc.checked_to_offset(offset) {
        Some(local) => format!("{:02}:{:02}", local.hour(), local.minute()),
        None => "--:--".to_owned(),
    }
}

/// Render a room message for local user `me`.
///
/// Messages without a server timestamp show `received_at` instead.
#[must_use]
pub fn render_message(
    message: &ChatMessage,
    me: &str,
    offset: UtcOffset,
    received_at: i64,
) -> Rendered {
    let time = format_time(message.sent_at().unwrap_or(received_at), offset);
    let content = message.content.clone().unwrap_or_default();

    match message.kind {
        MessageType::Join | MessageType::Leave => {
            let kind = if message.kind == MessageType::Join {
                EventKind::Join
            } else {
                EventKind::Leave
            };
            let text = if content.is_empty() {
                match kind {
                    EventKind::Join => format!("{} joined", message.sender),
                    EventKind::Leave => format!("{} left", message.sender),
                }
            } else {
                content
            };
            Rendered {
                entry: Entry::Event(EventLine { kind, text, time }),
                notify: false,
            }
        }
        MessageType::Chat => {
            let own = message.sender == me;
            Rendered {
                entry: Entry::Chat(ChatBubble {
                    sender: message.sender.clone(),
                    initial: avatar_initial(&message.sender),
                    color: avatar_color(&message.sender),
                    content,
                    time,
                    own,
                }),
                notify: !own,
            }
        }
    }
}

/// Render a private message for local user `me`.
#[must_use]
pub fn render_private(
    message: &PrivateMessage,
    me: &str,
    offset: UtcOffset,
    received_at: i64,
) -> Rendered {
    let timestamp = message.timestamp.filter(|ts| *ts > 0).unwrap_or(received_at);
    let sender = message.sender.clone().unwrap_or_else(|| "unknown".to_owned());
    let notify = sender != me;
    Rendered {
        entry: Entry::Whisper(Whisper {
            sender,
            recipient: message.recipient.clone(),
            content: message.content.clone(),
            time: format_time(timestamp, offset),
        }),
        notify,
    }
}

/// Uppercased first character of `sender`, `?` when empty.
#[must_use]
pub fn avatar_initial(sender: &str) -> String {
    sender
        .chars()
        .next()
        .map_or_else(|| "?".to_owned(), |c| c.to_uppercase().collect())
}

#[must_use]
pub fn now_millis() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
