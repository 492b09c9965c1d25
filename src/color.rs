//! Avatar palette and hex color helpers.

/// Fixed avatar palette, indexed by [`avatar_color`].
pub const AVATAR_PALETTE: [&str; 8] = [
    "#2196F3", "#32c787", "#00BCD4", "#ff5652", "#ffc107", "#ff85af", "#FF9800", "#39bbb0",
];

/// Palette color for `sender`.
///
/// The hash is `h = 31 * h + unit` over UTF-16 code units in double
/// precision with no integer wrap-around, so it agrees with the browser
/// client's arithmetic; the slot is `|h mod 8|`. Past about 200 units the
/// hash overflows to infinity and the first slot is used.
#[must_use]
pub fn avatar_color(sender: &str) -> &'static str {
    let hash = sender
        .encode_utf16()
        .fold(0.0_f64, |hash, unit| 31.0 * hash + f64::from(unit));
    let remainder = (hash % 8.0).abs();
    if !remainder.is_finite() {
        return AVATAR_PALETTE[0];
    }
    // remainder is an exact integer in 0..8
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let slot = remainder as usize;
    AVATAR_PALETTE.get(slot).copied().unwrap_or(AVATAR_PALETTE[0])
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => Some((
            channel(&hex[0..1].repeat(2))?,
            channel(&hex[1..2].repeat(2))?,
            channel(&hex[2..3].repeat(2))?,
        )),
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

fn channel(hex: &str) -> Option<u8> {
    match u8::from_str_radix(hex, 16) {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

#[cfg(test)]
#[path = "color_test.rs"]
mod tests;
