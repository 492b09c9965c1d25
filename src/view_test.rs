use super::*;
use crate::render::{EventKind, EventLine};

fn event(text: &str) -> Entry {
    Entry::Event(EventLine {
        kind: EventKind::Join,
        text: text.to_owned(),
        time: "00:00".to_owned(),
    })
}

fn snapshot(count: usize, users: &[&str]) -> PresenceSnapshot {
    PresenceSnapshot {
        count,
        users: users.iter().map(|u| (*u).to_owned()).collect(),
    }
}

// =============================================================
// PresencePanel
// =============================================================

#[test]
fn presence_excludes_local_user() {
    let panel = PresencePanel::from_snapshot(&snapshot(2, &["alice", "bob"]), "alice");
    assert_eq!(panel.count, 2);
    assert_eq!(panel.others, vec!["bob".to_owned()]);
}

#[test]
fn presence_replaces_previous_snapshot_wholesale() {
    let mut view = ChatView::new(None, true);
    view.replace_presence(&snapshot(3, &["alice", "bob", "carol"]), "alice");
    view.replace_presence(&snapshot(2, &["alice", "dave"]), "alice");
    assert_eq!(view.presence().count, 2);
    assert_eq!(view.presence().others, vec!["dave".to_owned()]);
}

// =============================================================
// MessageArea
// =============================================================

#[test]
fn unbounded_area_keeps_everything() {
    let mut area = MessageArea::new(None);
    for i in 0..100 {
        area.push(event(&i.to_string()));
    }
    assert_eq!(area.len(), 100);
}

#[test]
fn bounded_area_evicts_oldest_first() {
    let mut area = MessageArea::new(Some(2));
    area.push(event("one"));
    area.push(event("two"));
    area.push(event("three"));
    assert_eq!(area.len(), 2);
    assert_eq!(area.iter().next(), Some(&event("two")));
    assert_eq!(area.last(), Some(&event("three")));
}

#[test]
fn zero_capacity_means_unbounded() {
    let mut area = MessageArea::new(Some(0));
    area.push(event("one"));
    area.push(event("two"));
    assert_eq!(area.len(), 2);
}

// =============================================================
// ChatView updates
// =============================================================

#[test]
fn push_rendered_queues_bell_only_when_notifying_and_enabled() {
    let mut view = ChatView::new(None, true);
    view.push_rendered(Rendered {
        entry: event("a"),
        notify: true,
    });
    view.push_rendered(Rendered {
        entry: event("b"),
        notify: false,
    });
    assert_eq!(
        view.drain_updates(),
        vec![
            ViewUpdate::Appended(event("a")),
            ViewUpdate::Bell,
            ViewUpdate::Appended(event("b")),
        ]
    );

    let mut quiet = ChatView::new(None, false);
    quiet.push_rendered(Rendered {
        entry: event("a"),
        notify: true,
    });
    assert_eq!(quiet.drain_updates(), vec![ViewUpdate::Appended(event("a"))]);
}

#[test]
fn drain_updates_empties_the_queue() {
    let mut view = ChatView::new(None, true);
    view.set_connecting(true);
    view.alert("oops");
    assert_eq!(view.drain_updates().len(), 2);
    assert!(view.drain_updates().is_empty());
    assert!(view.is_connecting());
    assert_eq!(view.alerts(), ["oops".to_owned()]);
}

#[test]
fn clear_messages_empties_area_and_queues_cleared() {
    let mut view = ChatView::new(None, true);
    view.push_rendered(Rendered {
        entry: event("a"),
        notify: false,
    });
    view.drain_updates();
    view.clear_messages();
    assert!(view.messages().is_empty());
    assert_eq!(view.drain_updates(), vec![ViewUpdate::Cleared]);
}

#[test]
fn set_rooms_records_active_marker() {
    let mut view = ChatView::new(None, true);
    let rooms = vec![Room {
        id: "r1".to_owned(),
        name: "일반".to_owned(),
        user_count: 0,
    }];
    view.set_rooms(&rooms, Some("r1"));
    assert_eq!(view.active_room(), Some("r1"));
    assert_eq!(
        view.drain_updates(),
        vec![ViewUpdate::Rooms {
            rooms,
            active: Some("r1".to_owned()),
        }]
    );
}
