//! Chat session state machine: connection, rooms, subscriptions, rendering.
//!
//! STATES
//! ======
//! `Anonymous → Connecting → Connected → InRoom(id)`, then
//! `InRoom(id) → InRoom(id')` on every join. There is no way back: a transport
//! failure ends the session and the caller starts a fresh one after a delay.
//!
//! INVARIANTS
//! ==========
//! - At most one room subscription is live. [`ChatSession::join_room`] awaits
//!   UNSUBSCRIBE of the old id before it sends SUBSCRIBE for the new one.
//! - Inbound frames are routed through the channel table; frames for an id
//!   that is no longer in the table are dropped, so a message sent to the old
//!   room after a switch never shows up in the new one.
//! - Rooms mode loads the room list before auto-joining; the join is only
//!   issued once the load (or the default room create) returned.

use std::collections::HashMap;

use time::UtcOffset;
use tokio::sync::mpsc;

use crate::api::RoomApi;
use crate::error::{ChatError, ValidationError};
use crate::model::{ChatMessage, OutboundMessage, PresenceSnapshot, PrivateMessage, Room};
use crate::render::{now_millis, render_message, render_private};
use crate::topics::{
    ERROR_QUEUE, PRESENCE_TOPIC, PRIVATE_QUEUE, PRIVATE_SEND, PUBLIC_ROOM_ID, RoomTarget,
};
use crate::transport::{Connection, Connector, SubscriptionId, Transport, TransportEvent};
use crate::view::ChatView;

/// Name of the room created when the server has none.
pub const DEFAULT_ROOM_NAME: &str = "일반";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Connecting,
    Connected,
    InRoom(String),
}

/// Which server contract to speak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatMode {
    /// Room list, `/topic/room.{id}` and id-scoped `/app` destinations.
    Rooms,
    /// Single public room at `/topic/public`.
    Legacy,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub mode: ChatMode,
    pub default_room_name: String,
    pub utc_offset: UtcOffset,
    /// Cap on retained messages; `None` keeps everything.
    pub max_messages: Option<usize>,
    pub bell: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: ChatMode::Rooms,
            default_room_name: DEFAULT_ROOM_NAME.to_owned(),
            utc_offset: UtcOffset::UTC,
            max_messages: None,
            bell: true,
        }
    }
}

/// What a subscription id delivers.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Channel {
    Room,
    Presence,
    Errors,
    Private,
}

#[derive(Clone, Debug)]
struct RoomSubscription {
    id: SubscriptionId,
    room_id: String,
}

pub struct ChatSession<T, A> {
    api: A,
    options: SessionOptions,
    state: SessionState,
    username: String,
    transport: Option<T>,
    rooms: Vec<Room>,
    room_subscription: Option<RoomSubscription>,
    channels: HashMap<SubscriptionId, Channel>,
    view: ChatView,
}

impl<T: Transport, A: RoomApi> ChatSession<T, A> {
    #[must_use]
    pub fn new(api: A, options: SessionOptions) -> Self {
        let view = ChatView::new(options.max_messages, options.bell);
        Self {
            api,
            options,
            state: SessionState::Anonymous,
            username: String::new(),
            transport: None,
            rooms: Vec::new(),
            room_subscription: None,
            channels: HashMap::new(),
            view,
        }
    }

    // =========================================================================
    // CONNECTION
    // =========================================================================

    /// Open the transport as `username`, subscribe the presence and personal
    /// queues, then enter a room (rooms mode: load the room list and auto-join;
    /// legacy mode: join the public topic).
    ///
    /// Returns the inbound event stream; feed it to [`Self::handle_event`].
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyUsername`] before any network call.
    /// - Any connector error; the session stays `Connecting` and the view shows
    ///   the failure.
    /// - Transport errors while subscribing or joining. A failed room list
    ///   fetch is only logged.
    pub async fn connect<C>(
        &mut self,
        username: &str,
        connector: &C,
    ) -> Result<mpsc::UnboundedReceiver<TransportEvent>, ChatError>
    where
        C: Connector<Transport = T>,
    {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        if self.state != SessionState::Anonymous {
            return Err(ValidationError::AlreadyConnected.into());
        }

        self.username = username.to_owned();
        self.state = SessionState::Connecting;
        self.view.set_connecting(true);
        tracing::info!(username, "connecting");

        let Connection { transport, events } = match connector.connect().await {
            Ok(connection) => connection,
            Err(error) => {
                tracing::warn!(%error, "chat transport connect failed");
                self.view.set_status(format!("Connection failed: {error}"));
                return Err(error);
            }
        };
        self.transport = Some(transport);
        self.state = SessionState::Connected;

        self.subscribe_channel(PRESENCE_TOPIC, Channel::Presence).await?;
        self.subscribe_channel(ERROR_QUEUE, Channel::Errors).await?;
        self.subscribe_channel(PRIVATE_QUEUE, Channel::Private).await?;
        self.view.set_connecting(false);

        match self.options.mode {
            ChatMode::Legacy => self.join_public().await?,
            ChatMode::Rooms => {
                if let Err(error) = self.load_rooms().await {
                    if error.is_reloadable() {
                        return Err(error);
                    }
                    tracing::warn!(%error, "room list load failed");
                }
            }
        }
        Ok(events)
    }

    /// Best-effort DISCONNECT. Failures are logged, never returned.
    pub async fn disconnect(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        if let Err(error) = transport.disconnect().await {
            tracing::debug!(%error, "disconnect failed");
        }
        self.room_subscription = None;
        self.channels.clear();
        tracing::info!(username = %self.username, "disconnected");
    }

    // =========================================================================
    // ROOMS
    // =========================================================================

    /// Fetch the room list; create the default room when it is empty, else
    /// auto-join the first room unless a room is already active.
    ///
    /// # Errors
    ///
    /// REST errors from the fetch, plus whatever the create or join returns.
    pub async fn load_rooms(&mut self) -> Result<(), ChatError> {
        self.require_rooms_mode()?;
        let rooms = self.api.list_rooms().await?;
        tracing::info!(count = rooms.len(), "room list loaded");
        self.rooms = rooms;
        self.refresh_room_list();

        if self.rooms.is_empty() {
            let name = self.options.default_room_name.clone();
            self.create_room(&name).await?;
        } else if self.room_subscription.is_none() {
            let first = self.rooms[0].id.clone();
            self.join_room(&first).await?;
        }
        Ok(())
    }

    /// Re-emit the cached room list with the active marker. No request is
    /// made; the cache only changes on load and on local create.
    ///
    /// # Errors
    ///
    /// [`ValidationError::LegacyMode`] in single-room mode.
    pub fn show_rooms(&mut self) -> Result<(), ChatError> {
        self.require_rooms_mode()?;
        self.refresh_room_list();
        Ok(())
    }

    /// Create a room, append it to the cached list and join it.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyRoomName`] (with an alert, no request) for a
    /// blank name; the REST error (with an alert) when the create fails. The
    /// session stays usable either way.
    pub async fn create_room(&mut self, name: &str) -> Result<Room, ChatError> {
        self.require_rooms_mode()?;
        let name = name.trim();
        if name.is_empty() {
            let error = ValidationError::EmptyRoomName;
            self.view.alert(error.to_string());
            return Err(error.into());
        }
        self.require_connected()?;

        let room = match self.api.create_room(name).await {
            Ok(room) => room,
            Err(error) => {
                tracing::warn!(%error, name, "room create failed");
                self.view.alert(format!("Failed to create room: {error}"));
                return Err(error);
            }
        };
        tracing::info!(room_id = %room.id, name = %room.name, "room created");
        self.rooms.push(room.clone());
        self.refresh_room_list();
        self.join_room(&room.id).await?;
        Ok(room)
    }

    /// Switch the single room subscription to `room_id` and announce the join.
    ///
    /// An id missing from the cached list is looked up on the server first;
    /// an unknown id fails with [`ChatError::RoomNotFound`] and leaves the
    /// current subscription in place.
    ///
    /// # Errors
    ///
    /// Validation, lookup and transport errors.
    pub async fn join_room(&mut self, room_id: &str) -> Result<(), ChatError> {
        self.require_rooms_mode()?;
        self.require_connected()?;

        let room = match self.rooms.iter().find(|room| room.id == room_id) {
            Some(room) => room.clone(),
            None => self.lookup_room(room_id).await?,
        };

        let target = RoomTarget::Room(&room.id);
        self.switch_subscription(target, &room.id).await?;
        self.view.set_room_header(room.name.clone());
        self.refresh_room_list();
        self.send_join(target).await?;
        tracing::info!(room_id = %room.id, room = %room.name, "joined room");
        Ok(())
    }

    async fn lookup_room(&mut self, room_id: &str) -> Result<Room, ChatError> {
        match self.api.find_room(room_id).await {
            Ok(Some(room)) => {
                tracing::debug!(room_id, "room found outside cached list");
                self.rooms.push(room.clone());
                Ok(room)
            }
            Ok(None) => {
                let error = ChatError::RoomNotFound(room_id.to_owned());
                self.view.alert(error.to_string());
                Err(error)
            }
            Err(error) => {
                self.view.alert(format!("Failed to look up room: {error}"));
                Err(error)
            }
        }
    }

    async fn join_public(&mut self) -> Result<(), ChatError> {
        self.switch_subscription(RoomTarget::Public, PUBLIC_ROOM_ID).await?;
        self.view.set_room_header(PUBLIC_ROOM_ID);
        self.send_join(RoomTarget::Public).await?;
        tracing::info!("joined public room");
        Ok(())
    }

    /// Unsubscribe the current room (if any), clear the message list, then
    /// subscribe to `target`.
    async fn switch_subscription(
        &mut self,
        target: RoomTarget<'_>,
        room_id: &str,
    ) -> Result<(), ChatError> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(ValidationError::NotConnected)?;

        if let Some(previous) = self.room_subscription.take() {
            self.channels.remove(&previous.id);
            transport.unsubscribe(&previous.id).await?;
            tracing::debug!(room_id = %previous.room_id, "left room subscription");
        }
        self.view.clear_messages();

        let id = transport.subscribe(&target.topic()).await?;
        self.channels.insert(id.clone(), Channel::Room);
        self.room_subscription = Some(RoomSubscription {
            id,
            room_id: room_id.to_owned(),
        });
        self.state = SessionState::InRoom(room_id.to_owned());
        Ok(())
    }

    async fn send_join(&mut self, target: RoomTarget<'_>) -> Result<(), ChatError> {
        let body = serde_json::to_string(&OutboundMessage::join(&self.username))?;
        let destination = target.join_destination();
        self.transport_mut()?.send(&destination, body).await
    }

    async fn subscribe_channel(
        &mut self,
        destination: &str,
        channel: Channel,
    ) -> Result<(), ChatError> {
        let id = self.transport_mut()?.subscribe(destination).await?;
        self.channels.insert(id, channel);
        Ok(())
    }

    // =========================================================================
    // OUTBOUND MESSAGES
    // =========================================================================

    /// Send a chat line to the active room. Blank input is ignored.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NoActiveRoom`] before joining, or a transport error.
    pub async fn send_chat(&mut self, content: &str) -> Result<(), ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }
        let destination = match (&self.room_subscription, self.options.mode) {
            (None, _) => return Err(ValidationError::NoActiveRoom.into()),
            (Some(_), ChatMode::Legacy) => RoomTarget::Public.send_destination(),
            (Some(sub), ChatMode::Rooms) => RoomTarget::Room(&sub.room_id).send_destination(),
        };
        let body = serde_json::to_string(&OutboundMessage::chat(&self.username, content))?;
        self.transport_mut()?.send(&destination, body).await
    }

    /// Send a private message and echo it locally.
    ///
    /// # Errors
    ///
    /// Validation errors for a blank recipient or content, or a transport
    /// error.
    pub async fn send_private(&mut self, recipient: &str, content: &str) -> Result<(), ChatError> {
        let recipient = recipient.trim();
        let content = content.trim();
        if recipient.is_empty() {
            return Err(ValidationError::EmptyRecipient.into());
        }
        if content.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let mut message = PrivateMessage {
            sender: None,
            recipient: recipient.to_owned(),
            content: content.to_owned(),
            timestamp: None,
        };
        let body = serde_json::to_string(&message)?;
        self.transport_mut()?.send(PRIVATE_SEND, body).await?;

        message.sender = Some(self.username.clone());
        let echo = render_private(&message, &self.username, self.options.utc_offset, now_millis());
        self.view.push_rendered(echo);
        Ok(())
    }

    // =========================================================================
    // INBOUND EVENTS
    // =========================================================================

    /// Apply one transport event to the view.
    ///
    /// # Errors
    ///
    /// [`ChatError::Broker`] for a STOMP ERROR frame and
    /// [`ChatError::WsClosed`] when the socket ended. Both end the session.
    pub fn handle_event(&mut self, event: TransportEvent) -> Result<(), ChatError> {
        match event {
            TransportEvent::Message {
                subscription,
                destination,
                body,
            } => {
                let Some(channel) = self.channels.get(&subscription).cloned() else {
                    tracing::debug!(%subscription, destination, "dropping frame for inactive subscription");
                    return Ok(());
                };
                match channel {
                    Channel::Room => self.on_room_message(&body),
                    Channel::Presence => self.on_presence(&body),
                    Channel::Private => self.on_private(&body),
                    Channel::Errors => {
                        tracing::warn!(body = %body.trim(), "server reported an error");
                        self.view.alert(format!("Server error: {}", body.trim()));
                    }
                }
                Ok(())
            }
            TransportEvent::Receipt(receipt) => {
                tracing::debug!(receipt, "receipt");
                Ok(())
            }
            TransportEvent::Error { message, body } => {
                tracing::warn!(error = %message, body, "server sent ERROR frame");
                self.view.set_status(format!("Server error: {message}"));
                Err(ChatError::Broker(message))
            }
            TransportEvent::Closed(reason) => {
                self.view.set_status(format!("Disconnected: {reason}"));
                Err(ChatError::WsClosed(reason))
            }
        }
    }

    fn on_room_message(&mut self, body: &str) {
        match serde_json::from_str::<ChatMessage>(body) {
            Ok(message) => {
                let rendered =
                    render_message(&message, &self.username, self.options.utc_offset, now_millis());
                self.view.push_rendered(rendered);
            }
            Err(error) => tracing::warn!(%error, "ignoring malformed room message"),
        }
    }

    fn on_presence(&mut self, body: &str) {
        match serde_json::from_str::<PresenceSnapshot>(body) {
            Ok(snapshot) => self.view.replace_presence(&snapshot, &self.username),
            Err(error) => tracing::warn!(%error, "ignoring malformed presence snapshot"),
        }
    }

    fn on_private(&mut self, body: &str) {
        match serde_json::from_str::<PrivateMessage>(body) {
            Ok(message) => {
                let rendered =
                    render_private(&message, &self.username, self.options.utc_offset, now_millis());
                self.view.push_rendered(rendered);
            }
            Err(error) => tracing::warn!(%error, "ignoring malformed private message"),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn mode(&self) -> ChatMode {
        self.options.mode
    }

    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub fn active_room_id(&self) -> Option<&str> {
        self.room_subscription
            .as_ref()
            .map(|sub| sub.room_id.as_str())
    }

    #[must_use]
    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ChatView {
        &mut self.view
    }

    fn transport_mut(&mut self) -> Result<&mut T, ChatError> {
        self.transport
            .as_mut()
            .ok_or_else(|| ValidationError::NotConnected.into())
    }

    fn require_connected(&self) -> Result<(), ChatError> {
        if self.transport.is_some() {
            Ok(())
        } else {
            Err(ValidationError::NotConnected.into())
        }
    }

    fn require_rooms_mode(&self) -> Result<(), ChatError> {
        match self.options.mode {
            ChatMode::Rooms => Ok(()),
            ChatMode::Legacy => Err(ValidationError::LegacyMode.into()),
        }
    }

    fn refresh_room_list(&mut self) {
        let active = self
            .room_subscription
            .as_ref()
            .map(|sub| sub.room_id.as_str());
        self.view.set_rooms(&self.rooms, active);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
pub(crate) mod tests;
