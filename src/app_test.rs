use super::*;
use crate::session::tests::{Call, MockApi, MockConnector, session};
use std::sync::atomic::Ordering;

fn rooms() -> Vec<Room> {
    vec![
        Room {
            id: "r-1".into(),
            name: "일반".into(),
            user_count: 0,
        },
        Room {
            id: "r-2".into(),
            name: "Beta".into(),
            user_count: 0,
        },
    ]
}

fn lines(input: &'static str) -> Lines<&'static [u8]> {
    input.as_bytes().lines()
}

// =============================================================
// resolve_room
// =============================================================

#[test]
fn index_selects_from_cached_list() {
    assert_eq!(resolve_room(&rooms(), "1"), "r-1");
    assert_eq!(resolve_room(&rooms(), "2"), "r-2");
}

#[test]
fn out_of_range_index_is_treated_as_id() {
    assert_eq!(resolve_room(&rooms(), "0"), "0");
    assert_eq!(resolve_room(&rooms(), "3"), "3");
}

#[test]
fn non_numeric_target_is_an_id() {
    assert_eq!(resolve_room(&rooms(), "r-2"), "r-2");
    assert_eq!(resolve_room(&[], "abc"), "abc");
}

// =============================================================
// prompt_username
// =============================================================

#[tokio::test]
async fn prompt_repeats_until_non_blank() {
    let mut input = lines("\n   \n  alice \n");
    let mut out = Vec::new();

    let username = prompt_username(&mut input, &mut out).await.unwrap();

    assert_eq!(username.as_deref(), Some("alice"));
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("username: ").count(), 3);
    assert_eq!(printed.matches("please enter a username").count(), 2);
}

#[tokio::test]
async fn prompt_returns_none_at_end_of_input() {
    let mut input = lines("");
    let mut out = Vec::new();
    assert_eq!(prompt_username(&mut input, &mut out).await.unwrap(), None);
}

// =============================================================
// run_session
// =============================================================

const PLAIN: Style = Style { color: false };

/// Run one session as alice over `input`; returns the result and the output.
async fn drive(api: &MockApi, connector: &MockConnector, input: &'static str) -> (Result<(), ChatError>, String) {
    let mut session = session(api);
    let mut input = lines(input);
    let mut out = Vec::new();
    let result = run_session(&mut session, connector, "alice", &mut input, &mut out, PLAIN).await;
    (result, String::from_utf8(out).unwrap())
}

fn disconnects(connector: &MockConnector) -> usize {
    connector
        .calls
        .take()
        .into_iter()
        .filter(|call| *call == Call::Disconnect)
        .count()
}

#[tokio::test]
async fn quit_command_disconnects_and_returns_ok() {
    let api = MockApi::with_rooms(&[("a", "Alpha")]);
    let connector = MockConnector::default();

    let (result, _) = drive(&api, &connector, "/quit\nnot sent\n").await;

    assert!(result.is_ok());
    assert_eq!(connector.calls.take().last(), Some(&Call::Disconnect));
}

#[tokio::test]
async fn end_of_input_disconnects_and_returns_ok() {
    let api = MockApi::with_rooms(&[("a", "Alpha")]);
    let connector = MockConnector::default();

    let (result, _) = drive(&api, &connector, "").await;

    assert!(result.is_ok());
    assert_eq!(disconnects(&connector), 1);
}

#[tokio::test]
async fn transport_close_ends_session_with_reloadable_error() {
    let api = MockApi::with_rooms(&[("a", "Alpha")]);
    let connector = MockConnector::default();
    connector
        .queued
        .lock()
        .unwrap()
        .push(TransportEvent::Closed("server went away".into()));
    // Keep the writer alive so input stays pending.
    let (_keyboard, stdin) = tokio::io::duplex(64);
    let mut input = BufReader::new(stdin).lines();
    let mut session = session(&api);
    let mut out = Vec::new();

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_session(&mut session, &connector, "alice", &mut input, &mut out, PLAIN),
    )
    .await
    .expect("session should end on close");

    let err = result.unwrap_err();
    assert!(matches!(err, ChatError::WsClosed(ref reason) if reason == "server went away"));
    assert!(err.is_reloadable());
    assert_eq!(disconnects(&connector), 1);
    assert!(String::from_utf8(out).unwrap().contains("! Disconnected: server went away"));
}

#[tokio::test]
async fn validation_error_is_alerted_and_session_continues() {
    let api = MockApi::default();
    api.0.fail_list.store(true, Ordering::SeqCst);
    let connector = MockConnector::default();

    let (result, printed) = drive(&api, &connector, "hi\n/help\n").await;

    assert!(result.is_ok());
    assert_eq!(printed.matches("! join a room first").count(), 1);
    assert!(printed.contains(HELP));
    assert_eq!(disconnects(&connector), 1);
}

#[tokio::test]
async fn rest_error_is_alerted_once_and_session_continues() {
    let api = MockApi::with_rooms(&[("a", "Alpha")]);
    api.0.fail_create.store(true, Ordering::SeqCst);
    let connector = MockConnector::default();

    let (result, printed) = drive(&api, &connector, "/create Gamma\n/help\n").await;

    assert!(result.is_ok());
    assert_eq!(printed.matches("Failed to create room").count(), 1);
    assert_eq!(printed.matches("boom").count(), 1);
    assert!(printed.contains(HELP));
}

#[tokio::test]
async fn blank_room_name_is_alerted_once() {
    let api = MockApi::with_rooms(&[("a", "Alpha")]);
    let connector = MockConnector::default();

    let (result, printed) = drive(&api, &connector, "/create   \n").await;

    assert!(result.is_ok());
    assert_eq!(printed.matches("please enter a room name").count(), 1);
    assert_eq!(api.0.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rooms_command_prints_cached_list_without_refetching() {
    let quiet_api = MockApi::with_rooms(&[("a", "Alpha"), ("b", "Beta")]);
    let (_, baseline) = drive(&quiet_api, &MockConnector::default(), "").await;

    let api = MockApi::with_rooms(&[("a", "Alpha"), ("b", "Beta")]);
    let connector = MockConnector::default();
    let (result, printed) = drive(&api, &connector, "/rooms\n").await;

    assert!(result.is_ok());
    assert_eq!(api.0.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.0.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(printed.matches("rooms:").count(), baseline.matches("rooms:").count() + 1);
    assert!(printed.ends_with("rooms:\n * 1. Alpha (0)\n   2. Beta (0)\n"));
}

#[tokio::test]
async fn failure_after_transport_opened_still_disconnects() {
    let api = MockApi::with_rooms(&[("a", "Alpha")]);
    let connector = MockConnector {
        fail_subscribe_after: Some(1),
        ..MockConnector::default()
    };

    let (result, _) = drive(&api, &connector, "").await;

    assert!(result.unwrap_err().is_reloadable());
    assert_eq!(connector.calls.take().last(), Some(&Call::Disconnect));
}

#[tokio::test]
async fn connector_failure_reports_status_and_skips_disconnect() {
    let api = MockApi::default();
    let connector = MockConnector {
        fail: true,
        ..MockConnector::default()
    };

    let (result, printed) = drive(&api, &connector, "").await;

    assert!(matches!(result, Err(ChatError::Timeout)));
    assert!(printed.contains("! Connection failed"));
    assert!(connector.calls.take().is_empty());
}
