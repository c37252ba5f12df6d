// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with lenient `r;g;b` payload parsing.
//!
//! Color controls publish their value as three decimal channels separated by
//! semicolons (`"255;128;0"`). Parsing never fails: the first `<r>;<g>;<b>`
//! triplet found anywhere in the payload is used, channels outside 0-255
//! become 0, and a payload without any triplet decodes to black.

use std::fmt;

/// RGB color with 8-bit channels (0-255).
///
/// Serializes as `{"r": .., "g": .., "b": ..}`.
///
/// # Examples
///
/// ```
/// use homeui_model::types::RgbColor;
///
/// let color = RgbColor::from_payload("255;128;0");
/// assert_eq!(color.red(), 255);
/// assert_eq!(color.green(), 128);
/// assert_eq!(color.blue(), 0);
/// assert_eq!(color.to_payload(), "255;128;0");
///
/// // Out-of-range channels become 0
/// assert_eq!(RgbColor::from_payload("999;-1;50"), RgbColor::new(0, 0, 50));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct RgbColor {
    #[serde(rename = "r")]
    red: u8,
    #[serde(rename = "g")]
    green: u8,
    #[serde(rename = "b")]
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Decodes a color from a control payload.
    ///
    /// Looks for the first `<int>;<int>;<int>` sequence in the payload. Each
    /// channel that is not within 0-255 becomes 0. No match yields black.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        let Some([red, green, blue]) = find_triplet(payload) else {
            return Self::black();
        };
        Self::new(channel(red), channel(green), channel(blue))
    }

    /// Encodes the color as a `r;g;b` payload.
    #[must_use]
    pub fn to_payload(&self) -> String {
        format!("{};{};{}", self.red, self.green, self.blue)
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Creates a black color.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.red, self.green, self.blue)
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

// Converts a matched integer to a channel, out-of-range values become 0.
fn channel(digits: &str) -> u8 {
    digits
        .parse::<i64>()
        .ok()
        .and_then(|value| u8::try_from(value).ok())
        .unwrap_or(0)
}

/// Finds the leftmost `<int>;<int>;<int>` sequence, integers may be negative.
fn find_triplet(payload: &str) -> Option<[&str; 3]> {
    let bytes = payload.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if let Some(triplet) = match_triplet(payload, start) {
            return Some(triplet);
        }
        // Any later start inside the same integer reaches the same separator.
        start = match_integer(bytes, start).unwrap_or(start + 1);
    }
    None
}

fn match_triplet(payload: &str, start: usize) -> Option<[&str; 3]> {
    let bytes = payload.as_bytes();
    let first_end = match_integer(bytes, start)?;
    let second_start = expect_semicolon(bytes, first_end)?;
    let second_end = match_integer(bytes, second_start)?;
    let third_start = expect_semicolon(bytes, second_end)?;
    let third_end = match_integer(bytes, third_start)?;

    Some([
        &payload[start..first_end],
        &payload[second_start..second_end],
        &payload[third_start..third_end],
    ])
}

/// Matches `-?[0-9]+` at `pos` greedily and returns the end offset.
fn match_integer(bytes: &[u8], pos: usize) -> Option<usize> {
    let digits_start = if bytes.get(pos) == Some(&b'-') {
        pos + 1
    } else {
        pos
    };
    let digits = bytes
        .get(digits_start..)?
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    (digits > 0).then_some(digits_start + digits)
}

fn expect_semicolon(bytes: &[u8], pos: usize) -> Option<usize> {
    (bytes.get(pos) == Some(&b';')).then_some(pos + 1)
}
