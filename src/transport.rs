//! STOMP transport over a WebSocket, with or without the SockJS envelope.
//!
//! LIFECYCLE
//! =========
//! 1. [`StompConnector`] opens the socket, waits for the SockJS open frame
//!    (SockJS mode only), sends CONNECT and waits for CONNECTED, all under one
//!    connect timeout.
//! 2. A reader task decodes inbound frames and forwards them as
//!    [`TransportEvent`]s over an unbounded channel. It is the only reader.
//! 3. The session writes SUBSCRIBE / UNSUBSCRIBE / SEND through [`Transport`].
//! 4. [`Transport::disconnect`] sends DISCONNECT and closes the socket; the
//!    reader task is aborted on disconnect or drop.

use std::fmt;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use rand::distr::Alphanumeric;
use stomp::sockjs::{self, SockJsFrame};
use stomp::{Command, Frame};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::error::ChatError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Which framing the server endpoint speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportKind {
    /// SockJS WebSocket transport under `/ws/{server}/{session}/websocket`.
    #[value(name = "sockjs")]
    SockJs,
    /// Raw WebSocket at `/ws/websocket`.
    #[value(name = "websocket")]
    WebSocket,
}

/// Client-assigned STOMP subscription id (`sub-0`, `sub-1`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something the server pushed to us.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Message {
        subscription: SubscriptionId,
        destination: String,
        body: String,
    },
    Receipt(String),
    /// STOMP ERROR frame; the server closes the session after sending it.
    Error { message: String, body: String },
    /// The socket ended; carries the reason if one was given.
    Closed(String),
}

/// Outbound half of an established STOMP session.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Subscribe to `destination`, returning the id frames will arrive under.
    async fn subscribe(&mut self, destination: &str) -> Result<SubscriptionId, ChatError>;

    async fn unsubscribe(&mut self, subscription: &SubscriptionId) -> Result<(), ChatError>;

    /// SEND a JSON body to `destination`.
    async fn send(&mut self, destination: &str, body: String) -> Result<(), ChatError>;

    /// Best-effort DISCONNECT and socket close.
    async fn disconnect(&mut self) -> Result<(), ChatError>;
}

/// An established session: the writer plus the inbound event stream.
pub struct Connection<T> {
    pub transport: T,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transport sessions. One call per session lifetime.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    async fn connect(&self) -> Result<Connection<Self::Transport>, ChatError>;
}

/// [`Connector`] for a Spring-style STOMP endpoint at `{base_url}/ws`.
#[derive(Clone, Debug)]
pub struct StompConnector {
    base_url: String,
    kind: TransportKind,
    connect_timeout: Duration,
}

impl StompConnector {
    #[must_use]
    pub fn new(base_url: impl Into<String>, kind: TransportKind, connect_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            kind,
            connect_timeout,
        }
    }
}

#[async_trait::async_trait]
impl Connector for StompConnector {
    type Transport = StompTransport;

    async fn connect(&self) -> Result<Connection<StompTransport>, ChatError> {
        let (server_id, session_id) = sockjs_ids();
        let endpoint = endpoint(&self.base_url, self.kind, server_id, &session_id)?;
        tracing::info!(url = %endpoint.url, kind = ?self.kind, "opening chat transport");

        let kind = self.kind;
        let handshake = async {
            let (socket, _) = connect_async(endpoint.url.as_str()).await?;
            let (mut sink, mut source) = socket.split();
            if kind == TransportKind::SockJs {
                await_open(&mut source).await?;
            }
            write_frame(&mut sink, kind, &Frame::connect(&endpoint.host)).await?;
            let connected = await_connected(&mut source, kind).await?;
            Ok::<_, ChatError>((sink, source, connected))
        };
        let (sink, source, connected) = tokio::time::timeout(self.connect_timeout, handshake)
            .await
            .map_err(|_| ChatError::Timeout)??;

        tracing::info!(
            version = connected.header("version").unwrap_or("1.0"),
            server = connected.header("server").unwrap_or("unknown"),
            "stomp session established"
        );

        let (events_tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(source, kind, events_tx));
        Ok(Connection {
            transport: StompTransport {
                sink,
                kind,
                next_subscription: 0,
                reader,
            },
            events,
        })
    }
}

/// Writer half returned by [`StompConnector`].
pub struct StompTransport {
    sink: WsSink,
    kind: TransportKind,
    next_subscription: u64,
    reader: JoinHandle<()>,
}

#[async_trait::async_trait]
impl Transport for StompTransport {
    async fn subscribe(&mut self, destination: &str) -> Result<SubscriptionId, ChatError> {
        let id = SubscriptionId(format!("sub-{}", self.next_subscription));
        self.next_subscription += 1;
        write_frame(&mut self.sink, self.kind, &Frame::subscribe(id.as_str(), destination)).await?;
        tracing::debug!(%id, destination, "subscribed");
        Ok(id)
    }

    async fn unsubscribe(&mut self, subscription: &SubscriptionId) -> Result<(), ChatError> {
        write_frame(&mut self.sink, self.kind, &Frame::unsubscribe(subscription.as_str())).await?;
        tracing::debug!(%subscription, "unsubscribed");
        Ok(())
    }

    async fn send(&mut self, destination: &str, body: String) -> Result<(), ChatError> {
        write_frame(&mut self.sink, self.kind, &Frame::send(destination, body)).await
    }

    async fn disconnect(&mut self) -> Result<(), ChatError> {
        let receipt = format!("disconnect-{}", Uuid::new_v4());
        let sent = write_frame(&mut self.sink, self.kind, &Frame::disconnect(&receipt)).await;
        let closed = self.sink.close().await;
        self.reader.abort();
        sent?;
        closed.map_err(|error| ChatError::WsClosed(error.to_string()))
    }
}

impl Drop for StompTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

// =============================================================================
// WIRE HELPERS
// =============================================================================

/// Resolved socket URL plus the `host` header for CONNECT.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub url: String,
    pub host: String,
}

pub(crate) fn endpoint(
    base_url: &str,
    kind: TransportKind,
    server_id: u16,
    session_id: &str,
) -> Result<Endpoint, ChatError> {
    let base = base_url.trim_end_matches('/');
    let (scheme, rest) = if let Some(rest) = base.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = base.strip_prefix("https://") {
        ("wss", rest)
    } else {
        return Err(ChatError::InvalidBaseUrl(base_url.to_owned()));
    };

    let host = rest.split('/').next().unwrap_or_default().to_owned();
    if host.is_empty() {
        return Err(ChatError::InvalidBaseUrl(base_url.to_owned()));
    }
    let url = match kind {
        TransportKind::SockJs => format!(
            "{scheme}://{rest}/ws/{}",
            sockjs::session_path(server_id, session_id)
        ),
        TransportKind::WebSocket => format!("{scheme}://{rest}/ws/websocket"),
    };
    Ok(Endpoint { url, host })
}

/// Random SockJS server id (0-999) and 8-character session id.
pub(crate) fn sockjs_ids() -> (u16, String) {
    let mut rng = rand::rng();
    let server_id = rng.random_range(0..1000);
    let session_id = (&mut rng)
        .sample_iter(Alphanumeric)
        .take(8)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    (server_id, session_id)
}

async fn write_frame(sink: &mut WsSink, kind: TransportKind, frame: &Frame) -> Result<(), ChatError> {
    let text = stomp::encode_frame(frame);
    let payload = match kind {
        TransportKind::SockJs => sockjs::encode_sockjs(&[text])?,
        TransportKind::WebSocket => text,
    };
    sink.send(Message::Text(payload.into()))
        .await
        .map_err(|error| ChatError::WsClosed(error.to_string()))
}

/// One decoded socket message.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inbound {
    Open,
    Heartbeat,
    Frames(Vec<Frame>),
    Closed(String),
}

pub(crate) fn decode_inbound(kind: TransportKind, text: &str) -> Result<Inbound, ChatError> {
    match kind {
        TransportKind::WebSocket => Ok(Inbound::Frames(stomp::decode_frames(text)?)),
        TransportKind::SockJs => match sockjs::decode_sockjs(text)? {
            SockJsFrame::Open => Ok(Inbound::Open),
            SockJsFrame::Heartbeat => Ok(Inbound::Heartbeat),
            SockJsFrame::Messages(messages) => {
                let mut frames = Vec::new();
                for message in &messages {
                    frames.extend(stomp::decode_frames(message)?);
                }
                Ok(Inbound::Frames(frames))
            }
            SockJsFrame::Close { code, reason } => Ok(Inbound::Closed(format!("{code} {reason}"))),
        },
    }
}

async fn next_inbound(source: &mut WsSource, kind: TransportKind) -> Result<Inbound, ChatError> {
    loop {
        let Some(message) = source.next().await else {
            return Ok(Inbound::Closed("stream ended".to_owned()));
        };
        match message.map_err(|error| ChatError::WsClosed(error.to_string()))? {
            Message::Text(text) => return decode_inbound(kind, text.as_str()),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => return decode_inbound(kind, text),
                Err(error) => tracing::warn!(%error, "ignoring non-UTF-8 binary message"),
            },
            Message::Close(frame) => {
                let reason = frame.map_or_else(
                    || "closed by server".to_owned(),
                    |frame| format!("{} {}", frame.code, frame.reason),
                );
                return Ok(Inbound::Closed(reason));
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

async fn await_open(source: &mut WsSource) -> Result<(), ChatError> {
    loop {
        match next_inbound(source, TransportKind::SockJs).await? {
            Inbound::Open => return Ok(()),
            Inbound::Heartbeat => {}
            Inbound::Closed(reason) => return Err(ChatError::WsClosed(reason)),
            Inbound::Frames(_) => {
                return Err(ChatError::Handshake(
                    "expected SockJS open frame".to_owned(),
                ));
            }
        }
    }
}

async fn await_connected(source: &mut WsSource, kind: TransportKind) -> Result<Frame, ChatError> {
    loop {
        match next_inbound(source, kind).await? {
            Inbound::Open | Inbound::Heartbeat => {}
            Inbound::Closed(reason) => return Err(ChatError::WsClosed(reason)),
            Inbound::Frames(frames) => {
                for frame in frames {
                    match frame.command {
                        Command::Connected => return Ok(frame),
                        Command::Error => return Err(ChatError::Broker(error_message(&frame))),
                        other => tracing::debug!(command = %other, "ignoring frame before CONNECTED"),
                    }
                }
            }
        }
    }
}

async fn read_loop(
    mut source: WsSource,
    kind: TransportKind,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        let inbound = match next_inbound(&mut source, kind).await {
            Ok(inbound) => inbound,
            Err(ChatError::Codec(error)) => {
                tracing::warn!(%error, "dropping undecodable inbound message");
                continue;
            }
            Err(error) => Inbound::Closed(error.to_string()),
        };
        match inbound {
            Inbound::Open | Inbound::Heartbeat => {}
            Inbound::Closed(reason) => {
                tracing::info!(%reason, "chat transport closed");
                if events.send(TransportEvent::Closed(reason)).is_err() {
                    tracing::debug!("session gone before close notice");
                }
                return;
            }
            Inbound::Frames(frames) => {
                for event in frames.into_iter().filter_map(event_from_frame) {
                    if events.send(event).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

pub(crate) fn event_from_frame(frame: Frame) -> Option<TransportEvent> {
    match frame.command {
        Command::Message => {
            let Some(subscription) = frame.header("subscription") else {
                tracing::warn!("MESSAGE frame without subscription header");
                return None;
            };
            Some(TransportEvent::Message {
                subscription: SubscriptionId::new(subscription),
                destination: frame.header("destination").unwrap_or_default().to_owned(),
                body: frame.body,
            })
        }
        Command::Receipt => Some(TransportEvent::Receipt(
            frame.header("receipt-id").unwrap_or_default().to_owned(),
        )),
        Command::Error => Some(TransportEvent::Error {
            message: error_message(&frame),
            body: frame.body,
        }),
        other => {
            tracing::debug!(command = %other, "ignoring unexpected frame");
            None
        }
    }
}

fn error_message(frame: &Frame) -> String {
    match frame.header("message") {
        Some(message) if !message.is_empty() => message.to_owned(),
        _ => frame.body.trim().to_owned(),
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
