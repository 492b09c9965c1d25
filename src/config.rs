//! Command-line and environment configuration.
//!
//! Every flag has a `ROOMCHAT_*` environment fallback. [`Cli::into_config`]
//! validates the raw values into a [`ClientConfig`] before anything connects.

use std::time::Duration;

use clap::Parser;
use time::UtcOffset;

use crate::error::ChatError;
use crate::session::{ChatMode, DEFAULT_ROOM_NAME, SessionOptions};
use crate::transport::TransportKind;

#[derive(Parser, Debug, Clone)]
#[command(name = "roomchat", about = "Terminal client for STOMP-over-SockJS chat rooms")]
pub struct Cli {
    /// Server origin; REST lives under `/api`, STOMP under `/ws`.
    #[arg(long, env = "ROOMCHAT_BASE_URL", default_value = "http://127.0.0.1:8080")]
    pub base_url: String,

    /// Skip the username prompt.
    #[arg(long, env = "ROOMCHAT_USERNAME")]
    pub username: Option<String>,

    #[arg(long, value_enum, env = "ROOMCHAT_TRANSPORT", default_value = "sockjs")]
    pub transport: TransportKind,

    /// Talk to a single-room server (`/topic/public`).
    #[arg(long, env = "ROOMCHAT_LEGACY", default_value_t = false)]
    pub legacy: bool,

    /// Room created when the server has none.
    #[arg(long, env = "ROOMCHAT_DEFAULT_ROOM", default_value = DEFAULT_ROOM_NAME)]
    pub default_room: String,

    #[arg(long, env = "ROOMCHAT_RELOAD_DELAY_SECS", default_value_t = 5)]
    pub reload_delay_secs: u64,

    #[arg(long, env = "ROOMCHAT_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "ROOMCHAT_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Keep only the newest N messages (0 keeps everything).
    #[arg(long, env = "ROOMCHAT_MAX_MESSAGES")]
    pub max_messages: Option<usize>,

    /// Offset for rendered times, e.g. `+09:00`; defaults to the local offset.
    #[arg(long, env = "ROOMCHAT_UTC_OFFSET")]
    pub utc_offset: Option<String>,

    #[arg(long, env = "ROOMCHAT_NO_BELL", default_value_t = false)]
    pub no_bell: bool,

    #[arg(long, env = "ROOMCHAT_NO_COLOR", default_value_t = false)]
    pub no_color: bool,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` means prompt.
    pub username: Option<String>,
    pub transport: TransportKind,
    pub reload_delay: Duration,
    pub connect_timeout: Duration,
    pub http_timeout: Duration,
    pub color: bool,
    pub session: SessionOptions,
}

impl Cli {
    /// Validate into a [`ClientConfig`]. `local_offset` is used when no
    /// explicit offset was given.
    ///
    /// # Errors
    ///
    /// [`ChatError::InvalidBaseUrl`] or [`ChatError::Config`] for bad values.
    pub fn into_config(self, local_offset: UtcOffset) -> Result<ClientConfig, ChatError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        match reqwest::Url::parse(&base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ChatError::InvalidBaseUrl(self.base_url)),
        }

        if self.connect_timeout_secs == 0 {
            return Err(ChatError::Config("connect timeout must be at least 1 second".into()));
        }
        if self.http_timeout_secs == 0 {
            return Err(ChatError::Config("http timeout must be at least 1 second".into()));
        }
        let default_room_name = self.default_room.trim().to_owned();
        if default_room_name.is_empty() {
            return Err(ChatError::Config("default room name must not be empty".into()));
        }

        let utc_offset = match self.utc_offset.as_deref() {
            Some(raw) => parse_utc_offset(raw)?,
            None => local_offset,
        };
        let username = self
            .username
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());

        Ok(ClientConfig {
            base_url,
            username,
            transport: self.transport,
            reload_delay: Duration::from_secs(self.reload_delay_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            color: !self.no_color,
            session: SessionOptions {
                mode: if self.legacy {
                    ChatMode::Legacy
                } else {
                    ChatMode::Rooms
                },
                default_room_name,
                utc_offset,
                max_messages: self.max_messages.filter(|max| *max > 0),
                bell: !self.no_bell,
            },
        })
    }
}

/// Parse `Z`, `UTC`, `+HH`, `+HH:MM` or `-HH:MM`.
///
/// # Errors
///
/// [`ChatError::Config`] for anything else or an out-of-range offset.
pub fn parse_utc_offset(raw: &str) -> Result<UtcOffset, ChatError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    let invalid = || ChatError::Config(format!("invalid UTC offset `{raw}`, expected +HH:MM"));

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "00"));
    let is_field = |part: &str| (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit());
    if !is_field(hours) || !is_field(minutes) {
        return Err(invalid());
    }
    let hours: i8 = hours.parse().map_err(|_| invalid())?;
    let minutes: i8 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
