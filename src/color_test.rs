use super::*;

#[test]
fn avatar_color_matches_known_slots() {
    assert_eq!(avatar_color("alice"), "#2196F3");
    assert_eq!(avatar_color("bob"), "#ff85af");
    assert_eq!(avatar_color("carol"), "#32c787");
    assert_eq!(avatar_color("홍길동"), "#FF9800");
}

#[test]
fn avatar_color_hash_does_not_wrap_at_32_bits() {
    // A wrapping 32-bit hash would give #00BCD4, #39bbb0 and #ff5652 here.
    assert_eq!(avatar_color("alexander"), "#FF9800");
    assert_eq!(avatar_color("jonathan"), "#32c787");
    assert_eq!(avatar_color("administrator"), "#2196F3");
    assert_eq!(avatar_color("alexandria"), "#32c787");
}

#[test]
fn avatar_color_handles_hash_overflowing_to_infinity() {
    let name = "x".repeat(400);
    assert_eq!(avatar_color(&name), "#2196F3");
}

#[test]
fn avatar_color_is_stable_and_from_palette() {
    for name in ["", "a", "zzzzzzzzz", "user_with_long_name", "christopher"] {
        let first = avatar_color(name);
        assert_eq!(first, avatar_color(name));
        assert!(AVATAR_PALETTE.contains(&first));
    }
}

#[test]
fn parse_hex_rgb_supports_short_and_long_forms() {
    assert_eq!(parse_hex_rgb("#ABC"), Some((170, 187, 204)));
    assert_eq!(parse_hex_rgb("  #2196F3 "), Some((33, 150, 243)));
}

#[test]
fn parse_hex_rgb_rejects_invalid_inputs() {
    assert_eq!(parse_hex_rgb("AABBCC"), None);
    assert_eq!(parse_hex_rgb("#12"), None);
    assert_eq!(parse_hex_rgb("#abcd"), None);
    assert_eq!(parse_hex_rgb("#12GG34"), None);
    assert_eq!(parse_hex_rgb("#일반"), None);
}

#[test]
fn every_palette_entry_parses() {
    assert!(AVATAR_PALETTE.iter().all(|c| parse_hex_rgb(c).is_some()));
}
