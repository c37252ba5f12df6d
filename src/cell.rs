// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-control state machine.
//!
//! A [`Cell`] mirrors one control of a device: its declared type, its current
//! value and its metadata. A cell is *complete* once it has a type and either
//! a value or pushbutton semantics; only complete cells are listed on their
//! device.
//!
//! ```text
//!              set_type / receive_value
//!   Incomplete ────────────────────────► Complete
//!       │      ◄────────────────────────
//!       │        type or value removed
//!       ▼
//!    Erased    (type == incomplete and no value)
//! ```
//!
//! The cell itself only tracks its own fields. Attaching it to its device and
//! erasing it are done by the [`CellRegistry`](crate::registry::CellRegistry)
//! after each transition.
//!
//! # Examples
//!
//! ```
//! use homeui_model::Cell;
//! use homeui_model::types::CellValue;
//!
//! let mut cell = Cell::new("kitchen/temp1").unwrap();
//! assert!(!cell.is_complete());
//!
//! cell.set_type("temperature");
//! cell.receive_value("21.5");
//! assert!(cell.is_complete());
//! assert_eq!(cell.value(), Some(&CellValue::Number(21.5)));
//! assert_eq!(cell.units(), "°C");
//! ```

use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::protocol::Message;
use crate::topic::control_on_topic;
use crate::types::{CellType, CellValue, ValueKind, parse_number, same_number};

/// Id of the placeholder cell returned for unknown ids.
pub const PLACEHOLDER_ID: &str = "nosuchdev/nosuchcell";

static PLACEHOLDER: LazyLock<Cell> = LazyLock::new(|| Cell::from_parts("nosuchdev", "nosuchcell"));

/// Live state of one device control.
///
/// Two cells are equal when every field matches, NaN bounds and values
/// included.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Cell {
    id: String,
    device_id: String,
    control_id: String,
    name: String,
    #[serde(rename = "type")]
    cell_type: CellType,
    value: Option<CellValue>,
    units: String,
    read_only: bool,
    error: bool,
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
}

impl Cell {
    /// Creates an incomplete cell from a `<device>/<control>` id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCellId`] unless the id has exactly two
    /// non-empty segments.
    pub fn new(id: &str) -> Result<Self> {
        match id.split('/').collect::<Vec<_>>().as_slice() {
            [device_id, control_id] if !device_id.is_empty() && !control_id.is_empty() => {
                Ok(Self::from_parts(device_id, control_id))
            }
            _ => Err(Error::InvalidCellId(id.to_string())),
        }
    }

    pub(crate) fn from_parts(device_id: &str, control_id: &str) -> Self {
        Self {
            id: format!("{device_id}/{control_id}"),
            device_id: device_id.to_string(),
            control_id: control_id.to_string(),
            name: control_id.to_string(),
            cell_type: CellType::Incomplete,
            value: None,
            units: String::new(),
            read_only: false,
            error: false,
            min: None,
            max: None,
            step: None,
        }
    }

    /// Returns the shared placeholder cell (`nosuchdev/nosuchcell`).
    ///
    /// The placeholder is always incomplete and holds default values.
    #[must_use]
    pub fn placeholder() -> &'static Self {
        &PLACEHOLDER
    }

    // ========== Accessors ==========

    /// Returns the cell id, `<device>/<control>`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the id of the owning device.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the control id.
    #[must_use]
    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    /// Returns the display name, the control id unless named explicitly.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn cell_type(&self) -> &CellType {
        &self.cell_type
    }

    /// Returns the value kind derived from the type.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        self.cell_type.value_kind()
    }

    /// Returns the current value, `None` when there is none.
    #[must_use]
    pub fn value(&self) -> Option<&CellValue> {
        self.value.as_ref()
    }

    /// Returns the value encoded as a payload.
    ///
    /// Pushbuttons and cells without a value have none.
    #[must_use]
    pub fn string_value(&self) -> Option<String> {
        match (self.value_kind(), &self.value) {
            (ValueKind::Pushbutton, _) | (_, None) => None,
            (kind, Some(value)) => Some(kind.encode(Some(value))),
        }
    }

    /// Returns the display units.
    #[must_use]
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns `true` if writes are refused.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Returns `true` if the device reports an error for this control.
    #[must_use]
    pub fn error(&self) -> bool {
        self.error
    }

    /// Returns the lower bound, if any.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Returns the upper bound, if any.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Returns the step, if any.
    #[must_use]
    pub fn step(&self) -> Option<f64> {
        self.step
    }

    /// Returns `true` when the type is known and a value is present
    /// (pushbuttons need no value).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cell_type.is_incomplete()
            && (self.value_kind() == ValueKind::Pushbutton || self.value.is_some())
    }

    /// Returns `true` when both the type and the value are gone.
    pub(crate) fn is_erasable(&self) -> bool {
        self.cell_type.is_incomplete() && self.value.is_none()
    }

    // ========== Transitions ==========

    /// Sets the declared type from a `meta/type` payload.
    ///
    /// An empty payload reverts to [`CellType::Incomplete`]. The existing
    /// value is coerced into the new kind; textual cells without a value
    /// start with an empty string. Pushbuttons drop any stored value.
    pub fn set_type(&mut self, name: &str) {
        self.cell_type = CellType::from_name(name);
        self.fill_default_units();
        if self.value_kind() == ValueKind::Pushbutton {
            self.value = None;
        } else if let Some(value) = self.value.clone() {
            self.store(value);
        } else if self.cell_type.is_textual() {
            self.store(CellValue::String(String::new()));
        }
    }

    /// Applies a payload received on the value topic.
    ///
    /// An empty payload means the value was removed: textual cells keep an
    /// empty string, every other cell loses its value.
    pub fn receive_value(&mut self, payload: &str) {
        if payload.is_empty() {
            self.value = self
                .cell_type
                .is_textual()
                .then(|| CellValue::String(String::new()));
        } else if let Some(value) = self.value_kind().decode(payload) {
            self.value = Some(value);
        }
    }

    /// Requests a write from a local actor.
    ///
    /// Returns the message to publish, or `None` when the cell is incomplete
    /// or read-only. An empty string on a non-textual cell re-sends the
    /// current value. The value is stored locally before the message is
    /// returned; pushbuttons always publish the trigger payload.
    pub fn send_value(&mut self, value: CellValue) -> Option<Message> {
        if !self.is_complete() || self.read_only {
            return None;
        }

        let requested = if value.is_empty_string() && !self.cell_type.is_textual() {
            self.value.clone()
        } else {
            Some(value)
        };
        if let Some(value) = requested {
            self.store(value);
        }

        let payload = self.value_kind().encode(self.value.as_ref());
        Some(Message::new(
            control_on_topic(&self.device_id, &self.control_id),
            payload,
        ))
    }

    /// Sets the display name; an empty name reverts to the control id.
    pub fn set_name(&mut self, name: &str) {
        self.name = if name.is_empty() {
            self.control_id.clone()
        } else {
            name.to_string()
        };
    }

    /// Sets the display units; empty units fall back to the type default.
    pub fn set_units(&mut self, units: &str) {
        self.units = units.to_string();
        self.fill_default_units();
    }

    /// Sets the read-only flag.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Sets the error flag.
    pub fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    /// Sets the lower bound from a payload; empty clears it.
    pub fn set_min(&mut self, payload: &str) {
        self.min = parse_optional_number(payload);
    }

    /// Sets the upper bound from a payload; empty clears it.
    pub fn set_max(&mut self, payload: &str) {
        self.max = parse_optional_number(payload);
    }

    /// Sets the step from a payload; empty clears it.
    pub fn set_step(&mut self, payload: &str) {
        self.step = parse_optional_number(payload);
    }

    fn fill_default_units(&mut self) {
        if self.units.is_empty() {
            self.units = self.cell_type.default_units().to_string();
        }
    }

    // Pushbuttons leave the stored value untouched.
    fn store(&mut self, value: CellValue) {
        if let Some(value) = self.value_kind().coerce(value) {
            self.value = Some(value);
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.cell_type == other.cell_type
            && self.value == other.value
            && self.units == other.units
            && self.read_only == other.read_only
            && self.error == other.error
            && same_bound(self.min, other.min)
            && same_bound(self.max, other.max)
            && same_bound(self.step, other.step)
    }
}

fn same_bound(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_number(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn parse_optional_number(payload: &str) -> Option<f64> {
    (!payload.is_empty()).then(|| parse_number(payload))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::RgbColor;

    fn cell(id: &str, type_name: &str, payload: &str) -> Cell {
        let mut cell = Cell::new(id).unwrap();
        cell.set_type(type_name);
        cell.receive_value(payload);
        cell
    }

    #[test]
    fn new_cell_defaults() {
        let cell = Cell::new("dev/ctrl").unwrap();
        assert_eq!(cell.id(), "dev/ctrl");
        assert_eq!(cell.device_id(), "dev");
        assert_eq!(cell.control_id(), "ctrl");
        assert_eq!(cell.name(), "ctrl");
        assert!(cell.cell_type().is_incomplete());
        assert_eq!(cell.value_kind(), ValueKind::String);
        assert!(cell.value().is_none());
        assert!(!cell.is_complete());
        assert!(cell.is_erasable());
    }

    #[test]
    fn invalid_ids() {
        for id in ["dev", "a/b/c", "/b", "a/", ""] {
            assert!(matches!(Cell::new(id), Err(Error::InvalidCellId(_))), "{id}");
        }
    }

    #[test]
    fn placeholder_is_incomplete() {
        let placeholder = Cell::placeholder();
        assert_eq!(placeholder.id(), PLACEHOLDER_ID);
        assert!(!placeholder.is_complete());
        assert!(placeholder.value().is_none());
        assert_eq!(placeholder.units(), "");
        assert!(!placeholder.error());
    }

    #[test]
    fn temperature_scenario() {
        let cell = cell("kitchen/temp1", "temperature", "21.5");
        assert!(cell.is_complete());
        assert_eq!(cell.value_kind(), ValueKind::Number);
        assert_eq!(cell.value(), Some(&CellValue::Number(21.5)));
        assert_eq!(cell.units(), "°C");
        assert_eq!(cell.string_value().as_deref(), Some("21.5"));
    }

    #[test]
    fn value_before_type_is_coerced() {
        let mut cell = Cell::new("kitchen/temp1").unwrap();
        cell.receive_value("21.5");
        assert_eq!(cell.value(), Some(&CellValue::from("21.5")));
        assert!(!cell.is_complete());

        cell.set_type("temperature");
        assert_eq!(cell.value(), Some(&CellValue::Number(21.5)));
        assert!(cell.is_complete());
    }

    #[test]
    fn explicit_units_win() {
        let mut cell = Cell::new("kitchen/temp1").unwrap();
        cell.set_units("K");
        cell.set_type("temperature");
        assert_eq!(cell.units(), "K");

        cell.set_units("");
        assert_eq!(cell.units(), "°C");
    }

    #[test]
    fn textual_cell_starts_empty() {
        let mut cell = Cell::new("dev/label").unwrap();
        cell.set_type("text");
        assert_eq!(cell.value(), Some(&CellValue::from("")));
        assert!(cell.is_complete());

        cell.receive_value("hello");
        cell.receive_value("");
        assert_eq!(cell.value(), Some(&CellValue::from("")));
        assert!(cell.is_complete());
    }

    #[test]
    fn removing_value_makes_incomplete() {
        let mut cell = cell("dev/sw", "switch", "1");
        assert!(cell.is_complete());
        cell.receive_value("");
        assert!(cell.value().is_none());
        assert!(!cell.is_complete());
        assert!(!cell.is_erasable());
    }

    #[test]
    fn removing_type_then_value_is_erasable() {
        let mut cell = cell("dev/sw", "switch", "1");
        cell.set_type("");
        assert!(cell.cell_type().is_incomplete());
        assert!(cell.value().is_some());
        assert!(!cell.is_erasable());

        cell.receive_value("");
        assert!(cell.is_erasable());
    }

    #[test]
    fn pushbutton_is_complete_without_value() {
        let mut cell = Cell::new("panel/btn1").unwrap();
        cell.set_type("pushbutton");
        assert!(cell.is_complete());
        assert!(cell.value().is_none());
        assert!(cell.string_value().is_none());

        cell.receive_value("1");
        assert!(cell.value().is_none());
    }

    #[test]
    fn pushbutton_type_drops_earlier_value() {
        let mut cell = Cell::new("panel/btn1").unwrap();
        cell.receive_value("5");
        cell.set_type("pushbutton");
        assert!(cell.value().is_none());
        assert!(cell.is_complete());

        cell.set_type("");
        assert!(cell.is_erasable());
    }

    #[test]
    fn pushbutton_send_publishes_trigger() {
        let mut cell = Cell::new("panel/btn1").unwrap();
        cell.set_type("pushbutton");

        let message = cell.send_value(CellValue::from("anything")).unwrap();
        assert_eq!(message.topic, "/devices/panel/controls/btn1/on");
        assert_eq!(message.payload, "1");
        assert!(cell.value().is_none());

        let message = cell.send_value(CellValue::from("")).unwrap();
        assert_eq!(message.payload, "1");
    }

    #[test]
    fn send_stores_optimistically() {
        let mut cell = cell("dev/sw", "switch", "0");
        let message = cell.send_value(CellValue::Boolean(true)).unwrap();
        assert_eq!(message.payload, "1");
        assert_eq!(cell.value(), Some(&CellValue::Boolean(true)));
    }

    #[test]
    fn send_coerces_input() {
        let mut cell = cell("dev/level", "range", "10");
        let message = cell.send_value(CellValue::from("42")).unwrap();
        assert_eq!(message.payload, "42");
        assert_eq!(cell.value(), Some(&CellValue::Number(42.0)));
    }

    #[test]
    fn send_empty_resends_current_value() {
        let mut cell = cell("dev/level", "range", "10");
        let message = cell.send_value(CellValue::from("")).unwrap();
        assert_eq!(message.payload, "10");
        assert_eq!(cell.value(), Some(&CellValue::Number(10.0)));
    }

    #[test]
    fn send_empty_on_text_clears() {
        let mut cell = cell("dev/label", "text", "hello");
        let message = cell.send_value(CellValue::from("")).unwrap();
        assert_eq!(message.payload, "");
        assert_eq!(cell.value(), Some(&CellValue::from("")));
    }

    #[test]
    fn send_refused_when_incomplete_or_read_only() {
        let mut incomplete = Cell::new("dev/x").unwrap();
        incomplete.receive_value("5");
        assert!(incomplete.send_value(CellValue::from("6")).is_none());
        assert_eq!(incomplete.value(), Some(&CellValue::from("5")));

        let mut read_only = cell("dev/temp", "temperature", "20");
        read_only.set_read_only(true);
        assert!(read_only.send_value(CellValue::Number(25.0)).is_none());
        assert_eq!(read_only.value(), Some(&CellValue::Number(20.0)));
    }

    #[test]
    fn rgb_cell() {
        let mut cell = cell("dev/led", "rgb", "10;20;30");
        assert_eq!(
            cell.value(),
            Some(&CellValue::Rgb(RgbColor::new(10, 20, 30)))
        );
        let message = cell
            .send_value(CellValue::Rgb(RgbColor::new(1, 2, 3)))
            .unwrap();
        assert_eq!(message.payload, "1;2;3");
    }

    #[test]
    fn numeric_metadata() {
        let mut cell = Cell::new("dev/level").unwrap();
        cell.set_min("0");
        cell.set_max("100");
        cell.set_step("0.5");
        assert_eq!(cell.min(), Some(0.0));
        assert_eq!(cell.max(), Some(100.0));
        assert_eq!(cell.step(), Some(0.5));

        cell.set_max("");
        assert_eq!(cell.max(), None);

        cell.set_min("low");
        assert!(cell.min().unwrap().is_nan());
    }

    #[test]
    fn name_falls_back_to_control_id() {
        let mut cell = Cell::new("dev/ctrl").unwrap();
        cell.set_name("Kitchen light");
        assert_eq!(cell.name(), "Kitchen light");
        cell.set_name("");
        assert_eq!(cell.name(), "ctrl");
    }

    #[test]
    fn redelivery_is_idempotent() {
        let mut once = Cell::new("dev/temp").unwrap();
        once.set_type("temperature");
        once.receive_value("19");

        let mut twice = once.clone();
        twice.set_type("temperature");
        twice.receive_value("19");

        assert_eq!(once, twice);
    }

    #[test]
    fn serializes_snapshot() {
        let cell = cell("kitchen/temp1", "temperature", "21.5");
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json["id"], "kitchen/temp1");
        assert_eq!(json["type"], "temperature");
        assert_eq!(json["value"], 21.5);
        assert_eq!(json["units"], "°C");
        assert!(json["min"].is_null());
    }
}
