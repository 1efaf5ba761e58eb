//! Avatar colour helpers.
//!
//! Avatar colours are derived from the display name so every client computes
//! the same colour for the same name without coordination.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

/// Fixed avatar palette. Index = sum of UTF-16 code units of the name,
/// modulo the palette length.
pub const AVATAR_PALETTE: [&str; 15] = [
    "#F44336", "#E91E63", "#9C27B0", "#673AB7", "#3F51B5", "#2196F3", "#03A9F4", "#00BCD4", "#009688",
    "#4CAF50", "#8BC34A", "#CDDC39", "#FFC107", "#FF9800", "#FF5722",
];

/// Colour shown when a user has no usable avatar.
pub const FALLBACK_AVATAR: &str = "#cccccc";

/// Deterministic avatar colour for `name`.
#[must_use]
pub fn avatar_for_name(name: &str) -> &'static str {
    let sum: u64 = name.encode_utf16().map(u64::from).sum();
    let len = AVATAR_PALETTE.len() as u64;
    // sum % len < 15, so the cast back to usize is lossless.
    #[allow(clippy::cast_possible_truncation)]
    let index = (sum % len) as usize;
    AVATAR_PALETTE[index]
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut chars = hex.chars().map(|c| c.to_string().repeat(2));
            let r = channel(chars.next()?.as_str())?;
            let g = channel(chars.next()?.as_str())?;
            let b = channel(chars.next()?.as_str())?;
            Some((r, g, b))
        }
        6 => Some((channel(hex.get(0..2)?)?, channel(hex.get(2..4)?)?, channel(hex.get(4..6)?)?)),
        _ => None,
    }
}

/// Canonical lowercase `#rrggbb` for a stored avatar, or the fallback colour
/// when the avatar is missing or not a hex colour.
#[must_use]
pub fn display_color(avatar: Option<&str>) -> String {
    match avatar.and_then(parse_hex_rgb) {
        Some((r, g, b)) => format!("#{r:02x}{g:02x}{b:02x}"),
        None => FALLBACK_AVATAR.to_owned(),
    }
}
