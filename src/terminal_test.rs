use super::*;
use crate::model::Room;
use crate::render::EventKind;

const PLAIN: Style = Style { color: false };
const COLOR: Style = Style { color: true };

fn bubble(own: bool) -> ChatBubble {
    ChatBubble {
        sender: "alice".into(),
        initial: "A".into(),
        color: "#2196F3",
        content: "hi".into(),
        time: "22:13".into(),
        own,
    }
}

// =============================================================
// parse_input
// =============================================================

#[test]
fn plain_text_is_chat() {
    assert_eq!(parse_input("  hello there "), Input::Chat("hello there"));
    assert_eq!(parse_input("   "), Input::Empty);
}

#[test]
fn commands_parse_arguments() {
    assert_eq!(parse_input("/rooms"), Input::Rooms);
    assert_eq!(parse_input("/join 2"), Input::Join("2"));
    assert_eq!(parse_input("/join   abc-123 "), Input::Join("abc-123"));
    assert_eq!(parse_input("/create Book Club"), Input::Create("Book Club"));
    assert_eq!(parse_input("/who"), Input::Who);
    assert_eq!(parse_input("/help"), Input::Help);
    assert_eq!(parse_input("/quit"), Input::Quit);
    assert_eq!(parse_input("/exit"), Input::Quit);
}

#[test]
fn create_without_name_is_passed_through_blank() {
    assert_eq!(parse_input("/create"), Input::Create(""));
    assert_eq!(parse_input("/create   "), Input::Create(""));
}

#[test]
fn whisper_splits_recipient_from_text() {
    assert_eq!(
        parse_input("/msg bob see you at  noon"),
        Input::Whisper {
            to: "bob",
            text: "see you at  noon"
        }
    );
}

#[test]
fn missing_arguments_yield_usage() {
    assert_eq!(parse_input("/join"), Input::Usage("/join <n|id>"));
    assert_eq!(parse_input("/msg bob"), Input::Usage("/msg <user> <text>"));
    assert_eq!(parse_input("/msg"), Input::Usage("/msg <user> <text>"));
}

#[test]
fn unknown_command_is_reported() {
    assert_eq!(parse_input("/dance now"), Input::Unknown("dance"));
}

// =============================================================
// format_update
// =============================================================

#[test]
fn chat_line_without_color() {
    let text = format_entry(&Entry::Chat(bubble(false)), PLAIN);
    assert_eq!(text, "22:13 [A] alice: hi");
}

#[test]
fn own_chat_line_is_marked() {
    let text = format_entry(&Entry::Chat(bubble(true)), PLAIN);
    assert_eq!(text, "22:13 [A] alice (me): hi");
}

#[test]
fn colored_badge_uses_palette_rgb() {
    let text = format_entry(&Entry::Chat(bubble(false)), COLOR);
    assert!(text.contains("\x1b[48;2;33;150;243m"), "{text:?}");
}

#[test]
fn event_line_shows_icon() {
    let entry = Entry::Event(EventLine {
        kind: EventKind::Leave,
        text: "bob left".into(),
        time: "09:00".into(),
    });
    assert_eq!(format_entry(&entry, PLAIN), "09:00 ← bob left");
}

#[test]
fn room_list_marks_active_room() {
    let update = ViewUpdate::Rooms {
        rooms: vec![
            Room {
                id: "a".into(),
                name: "일반".into(),
                user_count: 2,
            },
            Room {
                id: "b".into(),
                name: "Beta".into(),
                user_count: 0,
            },
        ],
        active: Some("b".into()),
    };
    assert_eq!(
        format_update(&update, PLAIN).as_deref(),
        Some("rooms:\n   1. 일반 (2)\n * 2. Beta (0)")
    );
}

#[test]
fn presence_lists_others() {
    let panel = PresencePanel {
        count: 3,
        others: vec!["bob".into(), "carol".into()],
    };
    assert_eq!(format_presence(&panel), "online (3): bob, carol");
    assert_eq!(format_presence(&PresencePanel::default()), "online (0)");
}

#[test]
fn silent_updates_print_nothing() {
    assert_eq!(format_update(&ViewUpdate::Cleared, PLAIN), None);
    assert_eq!(format_update(&ViewUpdate::Connecting(false), PLAIN), None);
}

#[test]
fn write_updates_rings_bell_without_newline() {
    let mut out = Vec::new();
    write_updates(
        &mut out,
        &[ViewUpdate::Alert("x".into()), ViewUpdate::Bell, ViewUpdate::Cleared],
        PLAIN,
    )
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "! x\n\x07");
}
