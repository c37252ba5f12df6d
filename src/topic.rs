// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic parsing for the device control bus.
//!
//! Every piece of device state arrives on a topic below `/devices`:
//!
//! ```text
//! /devices/<dev>/meta/name                       → device display name
//! /devices/<dev>/controls/<ctrl>                 → cell value
//! /devices/<dev>/controls/<ctrl>/meta/<field>    → cell metadata
//! /devices/<dev>/controls/<ctrl>/on              → write request (outbound)
//! ```
//!
//! # Examples
//!
//! ```
//! use homeui_model::topic::{CellField, parse_cell_topic};
//!
//! let parsed = parse_cell_topic("/devices/kitchen/controls/temp1/meta/type").unwrap();
//! assert_eq!(parsed.device_id, "kitchen");
//! assert_eq!(parsed.control_id, "temp1");
//! assert_eq!(parsed.field, CellField::Type);
//! assert_eq!(parsed.cell_id(), "kitchen/temp1");
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// Root segment of every device topic.
const DEVICES: &str = "devices";
/// Segment separating the device id from the control id.
const CONTROLS: &str = "controls";

/// Cell topic broken into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTopic<'a> {
    /// Device id (segment 1).
    pub device_id: &'a str,
    /// Control id (segment 3).
    pub control_id: &'a str,
    /// What the topic addresses, derived from the suffix after the control id.
    pub field: CellField<'a>,
}

impl CellTopic<'_> {
    /// Returns the cell id, `<device>/<control>`.
    #[must_use]
    pub fn cell_id(&self) -> String {
        format!("{}/{}", self.device_id, self.control_id)
    }
}

/// Part of a cell addressed by a topic suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellField<'a> {
    /// No suffix: the cell value itself.
    Value,
    /// `meta/type`
    Type,
    /// `meta/name`
    Name,
    /// `meta/units`
    Units,
    /// `meta/readonly`
    ReadOnly,
    /// `meta/error`
    Error,
    /// `meta/min`
    Min,
    /// `meta/max`
    Max,
    /// `meta/step`
    Step,
    /// `on`, the write request topic.
    On,
    /// Any other suffix.
    Other(&'a str),
}

impl<'a> CellField<'a> {
    fn from_suffix(suffix: &'a str) -> Self {
        match suffix {
            "" => Self::Value,
            "meta/type" => Self::Type,
            "meta/name" => Self::Name,
            "meta/units" => Self::Units,
            "meta/readonly" => Self::ReadOnly,
            "meta/error" => Self::Error,
            "meta/min" => Self::Min,
            "meta/max" => Self::Max,
            "meta/step" => Self::Step,
            "on" => Self::On,
            other => Self::Other(other),
        }
    }

    /// Returns the topic suffix, without the leading separator.
    #[must_use]
    pub fn suffix(&self) -> &'a str {
        match self {
            Self::Value => "",
            Self::Type => "meta/type",
            Self::Name => "meta/name",
            Self::Units => "meta/units",
            Self::ReadOnly => "meta/readonly",
            Self::Error => "meta/error",
            Self::Min => "meta/min",
            Self::Max => "meta/max",
            Self::Step => "meta/step",
            Self::On => "on",
            Self::Other(suffix) => suffix,
        }
    }
}

impl fmt::Display for CellField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            other => write!(f, "{}", other.suffix()),
        }
    }
}

/// Splits a topic into its segments after stripping the leading separator.
fn split_topic(topic: &str) -> Result<Vec<&str>> {
    let stripped = topic
        .strip_prefix('/')
        .ok_or_else(|| Error::MalformedTopic(topic.to_string()))?;
    Ok(stripped.split('/').collect())
}

/// Parses `/devices/<dev>/controls/<ctrl>[/<suffix>]`.
///
/// # Errors
///
/// Returns [`Error::MalformedTopic`] if the topic has fewer than four
/// segments, the literal segments do not match, an id is empty, or a
/// separator follows the control id without a suffix.
pub fn parse_cell_topic(topic: &str) -> Result<CellTopic<'_>> {
    let malformed = || Error::MalformedTopic(topic.to_string());

    let stripped = topic.strip_prefix('/').ok_or_else(malformed)?;
    let mut parts = stripped.splitn(5, '/');
    let (Some(DEVICES), Some(device_id), Some(CONTROLS), Some(control_id)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    if device_id.is_empty() || control_id.is_empty() {
        return Err(malformed());
    }
    let field = match parts.next() {
        None => CellField::Value,
        Some("") => return Err(malformed()),
        Some(suffix) => CellField::from_suffix(suffix),
    };

    Ok(CellTopic {
        device_id,
        control_id,
        field,
    })
}

/// Parses `/devices/<dev>/meta/name` and returns the device id.
///
/// # Errors
///
/// Returns [`Error::MalformedTopic`] for any other shape.
pub fn parse_device_name_topic(topic: &str) -> Result<&str> {
    match split_topic(topic)?.as_slice() {
        [DEVICES, device_id, "meta", "name"] if !device_id.is_empty() => Ok(*device_id),
        _ => Err(Error::MalformedTopic(topic.to_string())),
    }
}

/// Builds the outbound write topic for a control.
///
/// ```
/// use homeui_model::topic::control_on_topic;
///
/// assert_eq!(control_on_topic("panel", "btn1"), "/devices/panel/controls/btn1/on");
/// ```
#[must_use]
pub fn control_on_topic(device_id: &str, control_id: &str) -> String {
    format!("/{DEVICES}/{device_id}/{CONTROLS}/{control_id}/on")
}

/// Checks whether a subscription pattern is a valid topic filter.
///
/// `+` must occupy a whole level; `#` must occupy the whole last level.
#[must_use]
pub fn is_valid_pattern(pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let levels: Vec<&str> = pattern.split('/').collect();
    let last = levels.len() - 1;
    levels.iter().enumerate().all(|(i, level)| match *level {
        "+" => true,
        "#" => i == last,
        other => !other.contains(['+', '#']),
    })
}

/// Matches a topic against a subscription pattern.
///
/// `+` matches exactly one level, `#` matches the remaining levels (including
/// none). Matching is done level by level, so `/devices/+/controls/+` does not
/// match `/devices/a/controls/b/meta/type`.
#[must_use]
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_levels = pattern.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_topic() {
        let parsed = parse_cell_topic("/devices/kitchen/controls/temp1").unwrap();
        assert_eq!(parsed.device_id, "kitchen");
        assert_eq!(parsed.control_id, "temp1");
        assert_eq!(parsed.field, CellField::Value);
    }

    #[test]
    fn parse_meta_topics() {
        let cases = [
            ("meta/type", CellField::Type),
            ("meta/name", CellField::Name),
            ("meta/units", CellField::Units),
            ("meta/readonly", CellField::ReadOnly),
            ("meta/error", CellField::Error),
            ("meta/min", CellField::Min),
            ("meta/max", CellField::Max),
            ("meta/step", CellField::Step),
            ("on", CellField::On),
        ];
        for (suffix, expected) in cases {
            let topic = format!("/devices/dev/controls/ctrl/{suffix}");
            assert_eq!(parse_cell_topic(&topic).unwrap().field, expected, "{topic}");
            assert_eq!(expected.suffix(), suffix);
        }
    }

    #[test]
    fn parse_unknown_suffix() {
        let parsed = parse_cell_topic("/devices/dev/controls/ctrl/meta/order").unwrap();
        assert_eq!(parsed.field, CellField::Other("meta/order"));
    }

    #[test]
    fn parse_too_short() {
        assert!(matches!(
            parse_cell_topic("/devices/dev/controls"),
            Err(Error::MalformedTopic(_))
        ));
        assert!(parse_cell_topic("/devices").is_err());
        assert!(parse_cell_topic("").is_err());
    }

    #[test]
    fn parse_wrong_shape() {
        assert!(parse_cell_topic("devices/dev/controls/ctrl").is_err());
        assert!(parse_cell_topic("/things/dev/controls/ctrl").is_err());
        assert!(parse_cell_topic("/devices/dev/meta/ctrl").is_err());
        assert!(parse_cell_topic("/devices//controls/ctrl").is_err());
        assert!(parse_cell_topic("/devices/dev/controls/").is_err());
    }

    #[test]
    fn parse_trailing_separator() {
        assert!(matches!(
            parse_cell_topic("/devices/dev/controls/ctrl/"),
            Err(Error::MalformedTopic(_))
        ));
        assert_eq!(
            parse_cell_topic("/devices/dev/controls/ctrl/meta/").unwrap().field,
            CellField::Other("meta/")
        );
    }

    #[test]
    fn parse_device_name() {
        assert_eq!(
            parse_device_name_topic("/devices/livingroom/meta/name").unwrap(),
            "livingroom"
        );
        assert!(parse_device_name_topic("/devices/livingroom/meta/type").is_err());
        assert!(parse_device_name_topic("/devices/livingroom/controls/x").is_err());
    }

    #[test]
    fn cell_id_joins_segments() {
        let parsed = parse_cell_topic("/devices/a/controls/b/meta/min").unwrap();
        assert_eq!(parsed.cell_id(), "a/b");
    }

    #[test]
    fn field_display() {
        assert_eq!(CellField::Value.to_string(), "value");
        assert_eq!(CellField::ReadOnly.to_string(), "meta/readonly");
    }

    #[test]
    fn single_level_wildcard() {
        assert!(topic_matches("/devices/+/controls/+", "/devices/a/controls/b"));
        assert!(!topic_matches("/devices/+/controls/+", "/devices/a/controls/b/on"));
        assert!(!topic_matches(
            "/devices/+/controls/+",
            "/devices/a/controls/b/meta/type"
        ));
        assert!(topic_matches(
            "/devices/+/controls/+/meta/type",
            "/devices/a/controls/b/meta/type"
        ));
        assert!(!topic_matches("/devices/+/meta/name", "/devices/a/controls/b"));
    }

    #[test]
    fn multi_level_wildcard() {
        assert!(topic_matches("/devices/#", "/devices/a/controls/b/meta/type"));
        assert!(topic_matches("/devices/#", "/devices"));
        assert!(!topic_matches("/devices/#", "/other/a"));
    }

    #[test]
    fn exact_match() {
        assert!(topic_matches("/devices/a/meta/name", "/devices/a/meta/name"));
        assert!(!topic_matches("/devices/a/meta/name", "/devices/b/meta/name"));
    }

    #[test]
    fn pattern_validation() {
        assert!(is_valid_pattern("/devices/+/controls/+"));
        assert!(is_valid_pattern("/devices/#"));
        assert!(!is_valid_pattern("/devices/#/x"));
        assert!(!is_valid_pattern("/devices/a+/x"));
        assert!(!is_valid_pattern(""));
    }
}
