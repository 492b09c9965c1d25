//! SockJS envelope for the WebSocket transport.
//!
//! A SockJS server prefixes every WebSocket text message with a one-letter
//! type: `o` open, `h` heartbeat, `a` a JSON array of message strings, `m` a
//! single JSON string, `c` a `[code, reason]` close. Clients send a bare JSON
//! array of strings.

use crate::CodecError;

/// One decoded SockJS server message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SockJsFrame {
    Open,
    Heartbeat,
    Messages(Vec<String>),
    Close { code: u16, reason: String },
}

/// Decode one SockJS server message.
///
/// # Errors
///
/// Returns [`CodecError::SockJs`] for an unknown prefix and
/// [`CodecError::Json`] when the payload does not match its prefix.
pub fn decode_sockjs(raw: &str) -> Result<SockJsFrame, CodecError> {
    let Some(kind) = raw.chars().next() else {
        return Err(CodecError::SockJs(String::new()));
    };
    let payload = &raw[kind.len_utf8()..];
    match kind {
        'o' => Ok(SockJsFrame::Open),
        'h' => Ok(SockJsFrame::Heartbeat),
        'a' => Ok(SockJsFrame::Messages(serde_json::from_str(payload)?)),
        'm' => Ok(SockJsFrame::Messages(vec![serde_json::from_str(payload)?])),
        'c' => {
            let (code, reason): (u16, String) = serde_json::from_str(payload)?;
            Ok(SockJsFrame::Close { code, reason })
        }
        _ => Err(CodecError::SockJs(raw.to_owned())),
    }
}

/// Wrap outbound message strings in the client envelope.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_sockjs(messages: &[String]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(messages)?)
}

/// Path segment of the WebSocket transport under the SockJS endpoint,
/// e.g. `042/k3j5x9qa/websocket`.
#[must_use]
pub fn session_path(server_id: u16, session_id: &str) -> String {
    format!("{:03}/{session_id}/websocket", server_id % 1000)
}

#[cfg(test)]
#[path = "sockjs_test.rs"]
mod tests;
