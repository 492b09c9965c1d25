//! Interactive loop: prompt, connect, dispatch input, reload on transport loss.
//!
//! LIFECYCLE
//! =========
//! [`run`] asks for a username once, then runs sessions back to back. A
//! session ends on `/quit`, end of input, Ctrl-C, or a transport error. Only
//! transport errors start another session, after `reload_delay`.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::api::{HttpRoomApi, RoomApi};
use crate::config::ClientConfig;
use crate::error::{ChatError, ValidationError};
use crate::model::Room;
use crate::session::ChatSession;
use crate::terminal::{HELP, Input, Style, format_presence, parse_input, write_updates};
use crate::transport::{Connector, StompConnector, Transport, TransportEvent};

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the client until the user quits.
///
/// # Errors
///
/// Configuration and I/O errors, and any non-transport error that escapes a
/// session. Transport errors are answered with a reload instead.
pub async fn run(config: ClientConfig) -> Result<(), ChatError> {
    let style = Style { color: config.color };
    let api = HttpRoomApi::new(&config.base_url, config.http_timeout)?;
    let connector =
        StompConnector::new(config.base_url.clone(), config.transport, config.connect_timeout);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = std::io::stdout();

    let username = match config.username.clone() {
        Some(username) => username,
        None => match prompt_username(&mut lines, &mut out).await? {
            Some(username) => username,
            None => return Ok(()),
        },
    };

    loop {
        let mut session = ChatSession::new(api.clone(), config.session.clone());
        let result = run_session(&mut session, &connector, &username, &mut lines, &mut out, style).await;
        match result {
            Ok(()) => return Ok(()),
            Err(error) if error.is_reloadable() => {
                tracing::warn!(%error, delay = ?config.reload_delay, "session lost, reloading");
                writeln!(
                    out,
                    "! {error}; reconnecting in {}s",
                    config.reload_delay.as_secs()
                )?;
                tokio::select! {
                    () = tokio::time::sleep(config.reload_delay) => {}
                    _ = tokio::signal::ctrl_c() => return Ok(()),
                }
            }
            Err(error) => return Err(error),
        }
    }
}

/// Ask until a non-blank username is entered. `None` at end of input.
///
/// # Errors
///
/// I/O errors on either stream.
pub async fn prompt_username<R, W>(lines: &mut Lines<R>, out: &mut W) -> Result<Option<String>, ChatError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        write!(out, "username: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let username = line.trim();
        if username.is_empty() {
            writeln!(out, "! {}", ValidationError::EmptyUsername)?;
            continue;
        }
        return Ok(Some(username.to_owned()));
    }
}

/// Connect `session` and pump input and transport events until it ends.
/// Always disconnects before returning.
///
/// # Errors
///
/// The transport error that ended the session, or an I/O error.
pub async fn run_session<C, A, R, W>(
    session: &mut ChatSession<C::Transport, A>,
    connector: &C,
    username: &str,
    lines: &mut Lines<R>,
    out: &mut W,
    style: Style,
) -> Result<(), ChatError>
where
    C: Connector,
    A: RoomApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = match session.connect(username, connector).await {
        Ok(events) => events,
        Err(error) => {
            session.disconnect().await;
            flush(session, out, style)?;
            return Err(error);
        }
    };
    flush(session, out, style)?;

    let result = loop {
        tokio::select! {
            event = events.recv() => {
                let event = event.unwrap_or_else(|| TransportEvent::Closed("event stream ended".into()));
                if let Err(error) = session.handle_event(event) {
                    break Err(error);
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(error) => break Err(error.into()),
                };
                match dispatch(session, &line, out).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break Ok(()),
                    Err(error) if error.is_reloadable() => break Err(error),
                    Err(error) => report(session, error),
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
        if let Err(error) = flush(session, out, style) {
            break Err(error);
        }
    };

    session.disconnect().await;
    flush(session, out, style)?;
    result
}

async fn dispatch<T, A, W>(session: &mut ChatSession<T, A>, line: &str, out: &mut W) -> Result<Flow, ChatError>
where
    T: Transport,
    A: RoomApi,
    W: Write,
{
    match parse_input(line) {
        Input::Empty => {}
        Input::Chat(text) => session.send_chat(text).await?,
        Input::Rooms => session.show_rooms()?,
        Input::Join(target) => {
            let room_id = resolve_room(session.rooms(), target);
            session.join_room(&room_id).await?;
        }
        Input::Create(name) => {
            session.create_room(name).await?;
        }
        Input::Who => writeln!(out, "{}", format_presence(session.view().presence()))?,
        Input::Whisper { to, text } => session.send_private(to, text).await?,
        Input::Help => writeln!(out, "{HELP}")?,
        Input::Quit => return Ok(Flow::Quit),
        Input::Usage(usage) => writeln!(out, "usage: {usage}")?,
        Input::Unknown(name) => writeln!(out, "unknown command /{name}, try /help")?,
    }
    Ok(Flow::Continue)
}

/// Surface a failed command. Room create, lookup and blank-name failures were
/// already alerted by the session.
fn report<T: Transport, A: RoomApi>(session: &mut ChatSession<T, A>, error: ChatError) {
    match &error {
        ChatError::Validation(ValidationError::EmptyRoomName)
        | ChatError::RoomNotFound(_)
        | ChatError::ServerError { .. }
        | ChatError::Http(_) => {
            tracing::debug!(%error, "command failed");
        }
        _ => session.view_mut().alert(error.to_string()),
    }
}

/// `/join` argument: a 1-based index into the cached list, else a room id.
#[must_use]
pub fn resolve_room(rooms: &[Room], target: &str) -> String {
    match target.parse::<usize>() {
        Ok(n) if (1..=rooms.len()).contains(&n) => rooms[n - 1].id.clone(),
        _ => target.to_owned(),
    }
}

fn flush<T, A, W>(session: &mut ChatSession<T, A>, out: &mut W, style: Style) -> Result<(), ChatError>
where
    T: Transport,
    A: RoomApi,
    W: Write,
{
    let updates = session.view_mut().drain_updates();
    write_updates(out, &updates, style)?;
    Ok(())
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
