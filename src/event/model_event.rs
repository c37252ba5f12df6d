// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model change events.

/// A change in the device model.
///
/// Cell ids have the form `<device>/<control>`; device ids are the bare
/// device segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ModelEvent {
    /// A cell was created or one of its attributes changed.
    CellUpdated {
        /// Cell id.
        id: String,
    },

    /// An incomplete cell without a value was erased.
    CellRemoved {
        /// Cell id.
        id: String,
    },

    /// A device was created, renamed, or its cell list changed.
    DeviceUpdated {
        /// Device id.
        id: String,
    },

    /// A device with no cells and no explicit name was collected.
    DeviceRemoved {
        /// Device id.
        id: String,
    },
}

impl ModelEvent {
    /// Returns the id of the cell or device the event refers to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::CellUpdated { id }
            | Self::CellRemoved { id }
            | Self::DeviceUpdated { id }
            | Self::DeviceRemoved { id } => id,
        }
    }

    /// Returns true for cell events.
    #[must_use]
    pub fn is_cell_event(&self) -> bool {
        matches!(self, Self::CellUpdated { .. } | Self::CellRemoved { .. })
    }

    /// Returns true for device events.
    #[must_use]
    pub fn is_device_event(&self) -> bool {
        !self.is_cell_event()
    }

    pub(crate) fn cell_updated(id: impl Into<String>) -> Self {
        Self::CellUpdated { id: id.into() }
    }

    pub(crate) fn cell_removed(id: impl Into<String>) -> Self {
        Self::CellRemoved { id: id.into() }
    }

    pub(crate) fn device_updated(id: impl Into<String>) -> Self {
        Self::DeviceUpdated { id: id.into() }
    }

    pub(crate) fn device_removed(id: impl Into<String>) -> Self {
        Self::DeviceRemoved { id: id.into() }
    }
}

impl std::fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CellUpdated { id } => write!(f, "cell {id} updated"),
            Self::CellRemoved { id } => write!(f, "cell {id} removed"),
            Self::DeviceUpdated { id } => write!(f, "device {id} updated"),
            Self::DeviceRemoved { id } => write!(f, "device {id} removed"),
        }
    }
}
