//! Error taxonomy for the chat client.
//!
//! Transport failures end the current run and are answered with a delayed
//! reload. REST and validation failures leave the session usable; callers
//! decide whether to alert or only log.

/// Input rejected client-side before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please enter a username")]
    EmptyUsername,
    #[error("please enter a room name")]
    EmptyRoomName,
    #[error("please enter a recipient")]
    EmptyRecipient,
    #[error("message is empty")]
    EmptyMessage,
    #[error("join a room first")]
    NoActiveRoom,
    #[error("not connected")]
    NotConnected,
    #[error("already connected")]
    AlreadyConnected,
    #[error("room list is not available in legacy mode")]
    LegacyMode,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("room {0} does not exist")]
    RoomNotFound(String),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed: {0}")]
    WsClosed(String),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("server sent ERROR: {0}")]
    Broker(String),
    #[error("frame codec failed: {0}")]
    Codec(#[from] stomp::CodecError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Whether this failure ends the transport session. The front-end answers
    /// these with a fixed-delay reload.
    #[must_use]
    pub fn is_reloadable(&self) -> bool {
        matches!(
            self,
            Self::WsConnect(_)
                | Self::WsClosed(_)
                | Self::Timeout
                | Self::Handshake(_)
                | Self::Broker(_)
                | Self::Codec(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ChatError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsConnect(Box::new(error))
    }
}
