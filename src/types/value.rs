// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value kinds and typed cell values.
//!
//! Payloads on the bus are plain strings. A [`ValueKind`] decides how a
//! payload is turned into a [`CellValue`] and how a value is written back.
//!
//! | Kind | Decode | Encode |
//! |------|--------|--------|
//! | string | identity | identity |
//! | boolean | `"1"` → true, else false | `"1"` / `"0"` |
//! | number | decimal parse, NaN on garbage | decimal |
//! | pushbutton | nothing is stored | always `"1"` |
//! | rgb | first `r;g;b` triplet | `r;g;b` |

use std::fmt;

use super::RgbColor;

/// Payload published to trigger a pushbutton.
pub const PUSHBUTTON_TRIGGER: &str = "1";

/// How the payload of a control is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Free text.
    String,
    /// On/off.
    Boolean,
    /// Decimal number, may be NaN.
    Number,
    /// Momentary trigger without a stored value.
    Pushbutton,
    /// RGB color.
    Rgb,
}

impl ValueKind {
    /// Decodes a non-empty payload.
    ///
    /// Returns `None` for [`ValueKind::Pushbutton`], which never stores a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use homeui_model::types::{CellValue, ValueKind};
    ///
    /// assert_eq!(ValueKind::Boolean.decode("1"), Some(CellValue::Boolean(true)));
    /// assert_eq!(ValueKind::Number.decode("21.5"), Some(CellValue::Number(21.5)));
    /// assert!(ValueKind::Number.decode("warm").unwrap().as_f64().unwrap().is_nan());
    /// assert_eq!(ValueKind::Pushbutton.decode("1"), None);
    /// ```
    #[must_use]
    pub fn decode(self, payload: &str) -> Option<CellValue> {
        match self {
            Self::String => Some(CellValue::String(payload.to_string())),
            Self::Boolean => Some(CellValue::Boolean(payload == "1")),
            Self::Number => Some(CellValue::Number(parse_number(payload))),
            Self::Pushbutton => None,
            Self::Rgb => Some(CellValue::Rgb(RgbColor::from_payload(payload))),
        }
    }

    /// Converts an already typed value into this kind.
    ///
    /// Values of the matching variant pass through untouched; anything else is
    /// encoded with its own kind and decoded with this one.
    #[must_use]
    pub fn coerce(self, value: CellValue) -> Option<CellValue> {
        match (self, value) {
            (Self::Pushbutton, _) => None,
            (Self::String, value @ CellValue::String(_))
            | (Self::Boolean, value @ CellValue::Boolean(_))
            | (Self::Number, value @ CellValue::Number(_))
            | (Self::Rgb, value @ CellValue::Rgb(_)) => Some(value),
            (kind, value) => kind.decode(&value.to_payload()),
        }
    }

    /// Encodes the payload that is published when writing `value`.
    ///
    /// Pushbuttons always publish [`PUSHBUTTON_TRIGGER`]. An rgb cell holding
    /// something other than a color encodes as an empty payload.
    #[must_use]
    pub fn encode(self, value: Option<&CellValue>) -> String {
        match (self, value) {
            (Self::Pushbutton, _) => PUSHBUTTON_TRIGGER.to_string(),
            (Self::Rgb, Some(CellValue::Rgb(color))) => color.to_payload(),
            (Self::Rgb, _) | (_, None) => String::new(),
            (Self::Boolean, Some(value)) => String::from(if value.is_truthy() { "1" } else { "0" }),
            (Self::String | Self::Number, Some(value)) => value.to_payload(),
        }
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Pushbutton => "pushbutton",
            Self::Rgb => "rgb",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of a cell.
///
/// Serializes untagged: strings, booleans and numbers as JSON scalars, colors
/// as `{"r", "g", "b"}` objects.
///
/// Equality treats NaN as equal to itself, so a redelivered payload that
/// failed to parse compares equal to the stored value.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Boolean value of switch-like cells.
    Boolean(bool),
    /// Numeric value, NaN when the payload was not a number.
    Number(f64),
    /// Text value.
    String(String),
    /// Color value.
    Rgb(RgbColor),
}

impl CellValue {
    /// Encodes the value with its own kind.
    #[must_use]
    pub fn to_payload(&self) -> String {
        match self {
            Self::String(text) => text.clone(),
            Self::Boolean(on) => String::from(if *on { "1" } else { "0" }),
            Self::Number(number) => format_number(*number),
            Self::Rgb(color) => color.to_payload(),
        }
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the flag if this is a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(on) => Some(*on),
            _ => None,
        }
    }

    /// Returns the number if this is a numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the color if this is an rgb value.
    #[must_use]
    pub fn as_rgb(&self) -> Option<RgbColor> {
        match self {
            Self::Rgb(color) => Some(*color),
            _ => None,
        }
    }

    /// Returns `true` if this is an empty string.
    #[must_use]
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::String(text) if text.is_empty())
    }

    fn is_truthy(&self) -> bool {
        match self {
            Self::Boolean(on) => *on,
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::String(text) => !text.is_empty(),
            Self::Rgb(_) => true,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => same_number(*a, *b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Rgb(a), Self::Rgb(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_payload())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<RgbColor> for CellValue {
    fn from(value: RgbColor) -> Self {
        Self::Rgb(value)
    }
}

/// Parses a decimal payload.
///
/// Surrounding whitespace is ignored and a blank payload is 0. Anything that
/// is not a decimal number yields NaN rather than an error.
///
/// ```
/// use homeui_model::types::parse_number;
///
/// assert_eq!(parse_number(" 21.5 "), 21.5);
/// assert_eq!(parse_number("-1e3"), -1000.0);
/// assert!(parse_number("21,5").is_nan());
/// ```
#[must_use]
pub fn parse_number(payload: &str) -> f64 {
    let trimmed = payload.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // `f64::from_str` also takes "inf" and "nan", which are not numbers here
        _ if trimmed
            .bytes()
            .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E')) =>
        {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Compares two stored numbers; NaN equals NaN.
#[allow(clippy::float_cmp)]
pub(crate) fn same_number(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Formats a number the way it is published on the bus.
///
/// Magnitudes from `1e-6` up to (excluding) `1e21` are written in plain
/// decimal, anything outside that range in exponent form with an explicit
/// sign.
///
/// ```
/// use homeui_model::types::format_number;
///
/// assert_eq!(format_number(21.5), "21.5");
/// assert_eq!(format_number(1e21), "1e+21");
/// assert_eq!(format_number(-2.5e-7), "-2.5e-7");
/// ```
#[must_use]
pub fn format_number(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_string()
    } else if number.is_infinite() {
        String::from(if number > 0.0 { "Infinity" } else { "-Infinity" })
    } else if number == 0.0 {
        "0".to_string()
    } else if !(1e-6..1e21).contains(&number.abs()) {
        let formatted = format!("{number:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        }
    } else {
        number.to_string()
    }
}
