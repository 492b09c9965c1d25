//! Line-oriented terminal front-end: input parsing and update printing.

use std::io::{self, Write};

use crate::color::parse_hex_rgb;
use crate::render::{ChatBubble, Entry, EventLine, Whisper};
use crate::view::{PresencePanel, ViewUpdate};

pub const HELP: &str = "\
commands:
  /rooms              list rooms
  /join <n|id>        join room by list number or id
  /create <name>      create a room and join it
  /who                show who is online
  /msg <user> <text>  send a private message
  /help               show this help
  /quit               leave
anything else is sent to the current room";

// =============================================================================
// INPUT
// =============================================================================

/// One parsed line of user input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Chat(&'a str),
    Rooms,
    Join(&'a str),
    /// Name may be blank; the session rejects it with an alert.
    Create(&'a str),
    Who,
    Whisper { to: &'a str, text: &'a str },
    Help,
    Quit,
    /// Known command with missing arguments; carries the usage line.
    Usage(&'static str),
    Unknown(&'a str),
}

#[must_use]
pub fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Chat(line);
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "rooms" => Input::Rooms,
        "join" if rest.is_empty() => Input::Usage("/join <n|id>"),
        "join" => Input::Join(rest),
        "create" => Input::Create(rest),
        "who" => Input::Who,
        "msg" => match rest.split_once(char::is_whitespace) {
            Some((to, text)) if !text.trim().is_empty() => Input::Whisper {
                to,
                text: text.trim(),
            },
            _ => Input::Usage("/msg <user> <text>"),
        },
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(name),
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";

impl Style {
    fn paint(self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_owned()
        }
    }

    /// Avatar badge: the initial on the sender's palette color.
    fn badge(self, bubble: &ChatBubble) -> String {
        match parse_hex_rgb(bubble.color) {
            Some((r, g, b)) if self.color => {
                format!("\x1b[48;2;{r};{g};{b}m\x1b[97m {} {RESET}", bubble.initial)
            }
            _ => format!("[{}]", bubble.initial),
        }
    }
}

/// Printable text for one update, without trailing newline. `None` when the
/// update has no line of its own.
#[must_use]
pub fn format_update(update: &ViewUpdate, style: Style) -> Option<String> {
    match update {
        ViewUpdate::Connecting(true) => Some(style.paint(DIM, "connecting...")),
        ViewUpdate::Connecting(false) | ViewUpdate::Cleared => None,
        ViewUpdate::Status(status) => Some(style.paint(YELLOW, &format!("! {status}"))),
        ViewUpdate::Rooms { rooms, active } => {
            if rooms.is_empty() {
                return Some("rooms: (none)".to_owned());
            }
            let mut out = String::from("rooms:");
            for (index, room) in rooms.iter().enumerate() {
                let marker = if active.as_deref() == Some(room.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                out.push_str(&format!(
                    "\n {marker} {}. {} ({})",
                    index + 1,
                    room.name,
                    room.user_count
                ));
            }
            Some(out)
        }
        ViewUpdate::RoomHeader(name) => Some(style.paint(BOLD, &format!("== {name} =="))),
        ViewUpdate::Appended(entry) => Some(format_entry(entry, style)),
        ViewUpdate::Presence(panel) => Some(format_presence(panel)),
        ViewUpdate::Alert(message) => Some(style.paint(YELLOW, &format!("! {message}"))),
        ViewUpdate::Bell => Some("\x07".to_owned()),
    }
}

#[must_use]
pub fn format_entry(entry: &Entry, style: Style) -> String {
    match entry {
        Entry::Event(EventLine { kind, text, time }) => {
            style.paint(DIM, &format!("{time} {} {text}", kind.icon()))
        }
        Entry::Chat(bubble) => {
            let sender = if bubble.own {
                format!("{} (me)", bubble.sender)
            } else {
                bubble.sender.clone()
            };
            format!(
                "{} {} {}: {}",
                style.paint(DIM, &bubble.time),
                style.badge(bubble),
                style.paint(BOLD, &sender),
                bubble.content
            )
        }
        Entry::Whisper(Whisper {
            sender,
            recipient,
            content,
            time,
        }) => style.paint(MAGENTA, &format!("{time} {sender} → {recipient} (private): {content}")),
    }
}

#[must_use]
pub fn format_presence(panel: &PresencePanel) -> String {
    if panel.others.is_empty() {
        format!("online ({})", panel.count)
    } else {
        format!("online ({}): {}", panel.count, panel.others.join(", "))
    }
}

/// Write every update in order. The bell is written without a newline.
///
/// # Errors
///
/// I/O errors from `out`.
pub fn write_updates<W: Write>(out: &mut W, updates: &[ViewUpdate], style: Style) -> io::Result<()> {
    for update in updates {
        match (update, format_update(update, style)) {
            (ViewUpdate::Bell, Some(text)) => write!(out, "{text}")?,
            (_, Some(text)) => writeln!(out, "{text}")?,
            (_, None) => {}
        }
    }
    out.flush()
}

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;
