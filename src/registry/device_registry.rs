// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records and their lifecycle.

use std::collections::BTreeMap;

/// A device as seen by the model.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Device {
    id: String,
    name: String,
    explicit: bool,
    cell_ids: Vec<String>,
}

impl Device {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            explicit: false,
            cell_ids: Vec::new(),
        }
    }

    /// Returns the device id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name; the id unless explicitly named.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once a name message has been received.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Returns the ids of the device's complete cells, sorted.
    #[must_use]
    pub fn cell_ids(&self) -> &[String] {
        &self.cell_ids
    }

    fn is_collectable(&self) -> bool {
        !self.explicit && self.cell_ids.is_empty()
    }
}

/// Device records by id.
///
/// Apart from [`ensure`](Self::ensure), every operation that can leave a
/// device unnamed and empty deletes it on the spot.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, Device>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the device if absent. Returns `true` if it was created.
    pub fn ensure(&mut self, id: &str) -> bool {
        if self.devices.contains_key(id) {
            return false;
        }
        tracing::trace!(device = %id, "Creating device record");
        self.devices.insert(id.to_string(), Device::new(id));
        true
    }

    /// Names the device explicitly, creating it if needed.
    pub fn set_explicit_name(&mut self, id: &str, name: &str) {
        self.ensure(id);
        if let Some(device) = self.devices.get_mut(id) {
            device.name = name.to_string();
            device.explicit = true;
        }
    }

    /// Reverts the name to the id and drops the explicit flag.
    ///
    /// Returns `true` if the device was garbage collected as a result.
    pub fn clear_explicit_name(&mut self, id: &str) -> bool {
        let Some(device) = self.devices.get_mut(id) else {
            return false;
        };
        device.name = id.to_string();
        device.explicit = false;
        self.collect_garbage(id)
    }

    /// Deletes the device if it is neither named nor holds cells.
    ///
    /// Returns `true` if the device was deleted.
    pub fn collect_garbage(&mut self, id: &str) -> bool {
        if !self.devices.get(id).is_some_and(Device::is_collectable) {
            return false;
        }
        tracing::debug!(device = %id, "Removing empty device");
        self.devices.remove(id);
        true
    }

    /// Inserts a cell id into the device's sorted list, creating the device
    /// if needed. Returns `true` if the list changed.
    pub fn add_cell(&mut self, device_id: &str, cell_id: &str) -> bool {
        self.ensure(device_id);
        let Some(device) = self.devices.get_mut(device_id) else {
            return false;
        };
        match device
            .cell_ids
            .binary_search_by(|existing| existing.as_str().cmp(cell_id))
        {
            Ok(_) => false,
            Err(pos) => {
                device.cell_ids.insert(pos, cell_id.to_string());
                true
            }
        }
    }

    /// Removes a cell id from the device's list, then collects the device if
    /// it became empty. Returns `true` if the list changed.
    pub fn remove_cell(&mut self, device_id: &str, cell_id: &str) -> bool {
        let Some(device) = self.devices.get_mut(device_id) else {
            return false;
        };
        let removed = match device
            .cell_ids
            .binary_search_by(|existing| existing.as_str().cmp(cell_id))
        {
            Ok(pos) => {
                device.cell_ids.remove(pos);
                true
            }
            Err(_) => false,
        };
        self.collect_garbage(device_id);
        removed
    }

    /// Returns a device by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Returns whether a device exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    /// Iterates over the devices in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Returns the number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if there are no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.devices.clear();
    }
}
