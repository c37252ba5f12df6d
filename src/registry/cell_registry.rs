// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cell ownership and message dispatch.
//!
//! [`CellRegistry::dispatch`] is the single entry point for bus messages. It
//! parses the topic, routes the payload to the right [`Cell`] transition,
//! then re-evaluates completeness:
//!
//! - a complete cell is listed on its device
//! - an incomplete cell is unlisted, and erased once it has neither type nor
//!   value
//! - a device left unnamed and empty is collected
//!
//! Each dispatch returns the [`ModelEvent`]s describing what changed.
//!
//! # Examples
//!
//! ```
//! use homeui_model::registry::CellRegistry;
//!
//! let mut registry = CellRegistry::new();
//! registry.dispatch("/devices/kitchen/controls/temp1/meta/type", "temperature").unwrap();
//! registry.dispatch("/devices/kitchen/controls/temp1", "21.5").unwrap();
//!
//! assert_eq!(registry.list_complete_ids(), vec!["kitchen/temp1".to_string()]);
//! assert_eq!(registry.lookup("kitchen/temp1").unwrap().units(), "°C");
//! ```

use std::collections::BTreeMap;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::event::ModelEvent;
use crate::protocol::Message;
use crate::topic::{CellField, CellTopic, parse_cell_topic, parse_device_name_topic};
use crate::types::{CellType, CellValue};

use super::{Device, DeviceRegistry};

/// Cells by id, together with the devices they belong to.
#[derive(Debug, Clone, Default)]
pub struct CellRegistry {
    cells: BTreeMap<String, Cell>,
    devices: DeviceRegistry,
}

impl CellRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell with the given id, creating an incomplete one if
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCellId`] unless the id has exactly two
    /// non-empty segments.
    pub fn get_or_create(&mut self, id: &str) -> Result<&Cell> {
        if !self.cells.contains_key(id) {
            let cell = Cell::new(id)?;
            self.cells.insert(id.to_string(), cell);
        }
        self.lookup(id)
    }

    /// Applies one bus message to the model.
    ///
    /// Accepts device name topics and cell topics. Suffixes without a cell
    /// field (such as `on`) leave the model untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTopic`] for topics of any other shape; the
    /// model is unchanged in that case.
    pub fn dispatch(&mut self, topic: &str, payload: &str) -> Result<Vec<ModelEvent>> {
        if let Ok(device_id) = parse_device_name_topic(topic) {
            return Ok(self.dispatch_device_name(device_id, payload));
        }

        let address = parse_cell_topic(topic)?;
        let cell_id = address.cell_id();
        let device_before = self.devices.get(address.device_id).cloned();
        let cell_before = self.cells.get(&cell_id).cloned();

        self.devices.ensure(address.device_id);
        if self.apply_field(&address, &cell_id, payload) {
            self.settle(&cell_id);
        }
        self.devices.collect_garbage(address.device_id);

        let mut events = Vec::new();
        if let Some(event) = cell_change(&cell_id, cell_before.as_ref(), self.cells.get(&cell_id)) {
            events.push(event);
        }
        if let Some(event) = device_change(
            address.device_id,
            device_before.as_ref(),
            self.devices.get(address.device_id),
        ) {
            events.push(event);
        }
        Ok(events)
    }

    fn dispatch_device_name(&mut self, device_id: &str, name: &str) -> Vec<ModelEvent> {
        let before = self.devices.get(device_id).cloned();
        if name.is_empty() {
            self.devices.clear_explicit_name(device_id);
        } else {
            self.devices.set_explicit_name(device_id, name);
        }
        device_change(device_id, before.as_ref(), self.devices.get(device_id))
            .into_iter()
            .collect()
    }

    /// Routes a payload to the addressed cell field. Returns `true` if the
    /// transition requires a completeness check.
    fn apply_field(&mut self, address: &CellTopic<'_>, cell_id: &str, payload: &str) -> bool {
        if matches!(address.field, CellField::On | CellField::Other(_)) {
            tracing::trace!(
                cell = %cell_id,
                field = %address.field,
                "Ignoring unsupported cell topic"
            );
            return false;
        }

        let cell = self
            .cells
            .entry(cell_id.to_string())
            .or_insert_with(|| Cell::from_parts(address.device_id, address.control_id));

        tracing::trace!(cell = %cell_id, field = %address.field, payload = %payload, "Applying message");
        match address.field {
            CellField::Value => {
                cell.receive_value(payload);
                true
            }
            CellField::Type => {
                cell.set_type(payload);
                true
            }
            CellField::Name => {
                cell.set_name(payload);
                false
            }
            CellField::Units => {
                cell.set_units(payload);
                false
            }
            CellField::ReadOnly => {
                cell.set_read_only(payload == "1");
                false
            }
            CellField::Error => {
                cell.set_error(!payload.is_empty());
                false
            }
            CellField::Min => {
                cell.set_min(payload);
                false
            }
            CellField::Max => {
                cell.set_max(payload);
                false
            }
            CellField::Step => {
                cell.set_step(payload);
                false
            }
            CellField::On | CellField::Other(_) => false,
        }
    }

    /// Lists or unlists the cell on its device, erasing it when it has
    /// neither type nor value.
    fn settle(&mut self, cell_id: &str) {
        let Some(cell) = self.cells.get(cell_id) else {
            return;
        };
        let device_id = cell.device_id().to_string();

        if cell.is_complete() {
            if self.devices.add_cell(&device_id, cell_id) {
                tracing::debug!(cell = %cell_id, "Cell complete");
            }
            return;
        }

        if self.devices.remove_cell(&device_id, cell_id) {
            tracing::debug!(cell = %cell_id, "Cell incomplete");
        }
        if cell.is_erasable() {
            tracing::debug!(cell = %cell_id, "Erasing cell");
            self.cells.remove(cell_id);
        }
    }

    /// Returns the ids of all complete cells, sorted.
    #[must_use]
    pub fn list_complete_ids(&self) -> Vec<String> {
        self.list_complete_ids_by(|_| true)
    }

    /// Returns the ids of complete cells accepted by `predicate`, sorted.
    #[must_use]
    pub fn list_complete_ids_by(&self, predicate: impl Fn(&Cell) -> bool) -> Vec<String> {
        self.cells
            .values()
            .filter(|cell| cell.is_complete() && predicate(cell))
            .map(|cell| cell.id().to_string())
            .collect()
    }

    /// Returns the ids of complete cells of the given type, sorted.
    #[must_use]
    pub fn complete_ids_by_type(&self, cell_type: &CellType) -> Vec<String> {
        self.list_complete_ids_by(|cell| cell.cell_type() == cell_type)
    }

    /// Returns a cell by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such cell exists.
    pub fn lookup(&self, id: &str) -> Result<&Cell> {
        self.cells
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Returns a cell by id, if present.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Requests a write on a cell.
    ///
    /// Returns the message to publish, or `None` when the cell is unknown or
    /// refuses the write (incomplete or read-only).
    pub fn send_value(&mut self, id: &str, value: CellValue) -> Option<Message> {
        let message = self.cells.get_mut(id)?.send_value(value);
        if message.is_none() {
            tracing::debug!(cell = %id, "Write refused");
        }
        message
    }

    /// Returns the device registry.
    #[must_use]
    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Returns a device by id.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Iterates over all cells, complete or not, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Returns the number of cells, complete or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if there are no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drops every cell and device, ahead of a full resubscription.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.devices.clear();
    }
}

fn cell_change(id: &str, before: Option<&Cell>, after: Option<&Cell>) -> Option<ModelEvent> {
    match (before, after) {
        (Some(_), None) => Some(ModelEvent::cell_removed(id)),
        (None, Some(_)) => Some(ModelEvent::cell_updated(id)),
        (Some(old), Some(new)) if old != new => Some(ModelEvent::cell_updated(id)),
        _ => None,
    }
}

fn device_change(id: &str, before: Option<&Device>, after: Option<&Device>) -> Option<ModelEvent> {
    match (before, after) {
        (Some(_), None) => Some(ModelEvent::device_removed(id)),
        (None, Some(_)) => Some(ModelEvent::device_updated(id)),
        (Some(old), Some(new)) if old != new => Some(ModelEvent::device_updated(id)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn registry_with(messages: &[(&str, &str)]) -> CellRegistry {
        let mut registry = CellRegistry::new();
        for (topic, payload) in messages {
            registry.dispatch(topic, payload).unwrap();
        }
        registry
    }

    #[test]
    fn get_or_create_validates_id() {
        let mut registry = CellRegistry::new();
        assert!(registry.get_or_create("dev/ctrl").is_ok());
        assert!(matches!(
            registry.get_or_create("dev"),
            Err(Error::InvalidCellId(_))
        ));
        assert!(matches!(
            registry.get_or_create("a/b/c"),
            Err(Error::InvalidCellId(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn malformed_topic_leaves_state_unchanged() {
        let mut registry = registry_with(&[("/devices/a/controls/x/meta/type", "switch")]);
        let before = registry.list_complete_ids();

        let result = registry.dispatch("/devices/a/x", "1");
        assert!(matches!(result, Err(Error::MalformedTopic(_))));
        assert_eq!(registry.list_complete_ids(), before);
    }

    #[test]
    fn type_then_value_completes_cell() {
        let registry = registry_with(&[
            ("/devices/kitchen/controls/temp1/meta/type", "temperature"),
            ("/devices/kitchen/controls/temp1", "21.5"),
        ]);

        let cell = registry.lookup("kitchen/temp1").unwrap();
        assert!(cell.is_complete());
        assert_eq!(cell.value().and_then(CellValue::as_f64), Some(21.5));
        assert_eq!(
            registry.device("kitchen").unwrap().cell_ids(),
            ["kitchen/temp1"]
        );
    }

    #[test]
    fn value_before_type_completes_on_type() {
        let mut registry = registry_with(&[("/devices/a/controls/sw", "1")]);
        assert!(registry.list_complete_ids().is_empty());
        assert!(registry.device("a").is_none());

        registry
            .dispatch("/devices/a/controls/sw/meta/type", "switch")
            .unwrap();
        assert_eq!(
            registry.lookup("a/sw").unwrap().value(),
            Some(&CellValue::Boolean(true))
        );
        assert_eq!(registry.list_complete_ids(), ["a/sw"]);
    }

    #[test]
    fn losing_value_unlists_but_keeps_cell() {
        let mut registry = registry_with(&[
            ("/devices/a/controls/t/meta/type", "temperature"),
            ("/devices/a/controls/t", "20"),
        ]);

        let events = registry.dispatch("/devices/a/controls/t", "").unwrap();
        assert!(registry.find("a/t").is_some());
        assert!(registry.list_complete_ids().is_empty());
        assert!(registry.device("a").is_none());
        assert_eq!(
            events,
            vec![ModelEvent::cell_updated("a/t"), ModelEvent::device_removed("a")]
        );
    }

    #[test]
    fn incomplete_type_and_no_value_erases_cell() {
        let mut registry = registry_with(&[
            ("/devices/a/controls/t/meta/type", "temperature"),
            ("/devices/a/controls/t", "20"),
            ("/devices/a/controls/t/meta/type", ""),
        ]);
        assert!(registry.find("a/t").is_some());

        let events = registry.dispatch("/devices/a/controls/t", "").unwrap();
        assert!(registry.find("a/t").is_none());
        assert_eq!(events, vec![ModelEvent::cell_removed("a/t")]);
    }

    #[test]
    fn metadata_only_cell_leaves_no_device() {
        let registry = registry_with(&[("/devices/a/controls/t/meta/name", "Thermo")]);
        assert_eq!(registry.lookup("a/t").unwrap().name(), "Thermo");
        assert!(registry.devices().is_empty());
    }

    #[test]
    fn metadata_fields_are_applied() {
        let registry = registry_with(&[
            ("/devices/a/controls/r/meta/type", "range"),
            ("/devices/a/controls/r/meta/units", "%"),
            ("/devices/a/controls/r/meta/readonly", "1"),
            ("/devices/a/controls/r/meta/error", "r"),
            ("/devices/a/controls/r/meta/min", "0"),
            ("/devices/a/controls/r/meta/max", "100"),
            ("/devices/a/controls/r/meta/step", "0.5"),
        ]);

        let cell = registry.lookup("a/r").unwrap();
        assert_eq!(cell.units(), "%");
        assert!(cell.read_only());
        assert!(cell.error());
        assert_eq!(cell.min(), Some(0.0));
        assert_eq!(cell.max(), Some(100.0));
        assert_eq!(cell.step(), Some(0.5));
    }

    #[test]
    fn readonly_requires_exact_one() {
        let registry = registry_with(&[("/devices/a/controls/r/meta/readonly", "true")]);
        assert!(!registry.lookup("a/r").unwrap().read_only());
    }

    #[test]
    fn on_topic_is_ignored() {
        let mut registry = CellRegistry::new();
        let events = registry.dispatch("/devices/a/controls/x/on", "1").unwrap();
        assert!(events.is_empty());
        assert!(registry.is_empty());
        assert!(registry.devices().is_empty());
    }

    #[test]
    fn device_name_lifecycle() {
        let mut registry = CellRegistry::new();
        let events = registry
            .dispatch("/devices/livingroom/meta/name", "Living room")
            .unwrap();
        assert_eq!(events, vec![ModelEvent::device_updated("livingroom")]);
        assert_eq!(registry.device("livingroom").unwrap().name(), "Living room");

        let events = registry.dispatch("/devices/livingroom/meta/name", "").unwrap();
        assert_eq!(events, vec![ModelEvent::device_removed("livingroom")]);
        assert!(registry.device("livingroom").is_none());
    }

    #[test]
    fn empty_name_for_unknown_device_is_noop() {
        let mut registry = CellRegistry::new();
        let events = registry.dispatch("/devices/ghost/meta/name", "").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn redelivery_is_idempotent() {
        let messages = [
            ("/devices/a/controls/c/meta/type", "rgb"),
            ("/devices/a/controls/c", "10;20;30"),
            ("/devices/a/meta/name", "Lamp"),
        ];
        let mut registry = registry_with(&messages);
        let snapshot: Vec<Cell> = registry.iter().cloned().collect();
        let devices: Vec<Device> = registry.devices().iter().cloned().collect();

        for (topic, payload) in messages {
            let events = registry.dispatch(topic, payload).unwrap();
            assert!(events.is_empty(), "redelivery of {topic} produced {events:?}");
        }
        assert_eq!(registry.iter().cloned().collect::<Vec<_>>(), snapshot);
        assert_eq!(registry.devices().iter().cloned().collect::<Vec<_>>(), devices);
    }

    #[test]
    fn complete_ids_sorted_and_filtered() {
        let registry = registry_with(&[
            ("/devices/b/controls/x/meta/type", "switch"),
            ("/devices/b/controls/x", "0"),
            ("/devices/a/controls/y/meta/type", "temperature"),
            ("/devices/a/controls/y", "3"),
            ("/devices/a/controls/p/meta/type", "pushbutton"),
            ("/devices/a/controls/z", "orphan"),
        ]);

        assert_eq!(registry.list_complete_ids(), ["a/p", "a/y", "b/x"]);
        assert_eq!(
            registry.complete_ids_by_type(&CellType::Switch),
            ["b/x"]
        );
        assert_eq!(
            registry.list_complete_ids_by(|cell| cell.device_id() == "a"),
            ["a/p", "a/y"]
        );
    }

    #[test]
    fn lookup_and_find() {
        let registry = registry_with(&[("/devices/a/controls/x/meta/type", "text")]);
        assert!(registry.lookup("a/x").is_ok());
        assert!(matches!(registry.lookup("a/nope"), Err(Error::NotFound(_))));
        assert!(registry.find("a/nope").is_none());
    }

    #[test]
    fn send_value_on_complete_cell() {
        let mut registry = registry_with(&[
            ("/devices/a/controls/sw/meta/type", "switch"),
            ("/devices/a/controls/sw", "0"),
        ]);

        let message = registry.send_value("a/sw", CellValue::Boolean(true)).unwrap();
        assert_eq!(message, Message::new("/devices/a/controls/sw/on", "1"));
        assert_eq!(
            registry.lookup("a/sw").unwrap().value(),
            Some(&CellValue::Boolean(true))
        );
    }

    #[test]
    fn send_value_refused() {
        let mut registry = registry_with(&[
            ("/devices/a/controls/t/meta/type", "temperature"),
            ("/devices/a/controls/ro/meta/type", "switch"),
            ("/devices/a/controls/ro/meta/readonly", "1"),
            ("/devices/a/controls/ro", "1"),
        ]);

        assert!(registry.send_value("a/t", CellValue::Number(1.0)).is_none());
        assert!(registry.send_value("a/ro", CellValue::Boolean(false)).is_none());
        assert!(registry.send_value("a/missing", CellValue::Number(1.0)).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut registry = registry_with(&[
            ("/devices/a/controls/t/meta/type", "text"),
            ("/devices/b/meta/name", "B"),
        ]);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.devices().is_empty());
    }
}
