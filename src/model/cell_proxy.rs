// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Null-object view on a cell.

use crate::cell::Cell;
use crate::error::Result;
use crate::types::{CellType, CellValue, ValueKind};

use super::DeviceData;

/// A view on a cell by id.
///
/// The proxy resolves its id on every access. While the cell is unknown,
/// reads come from the shared placeholder cell and writes are ignored, so a
/// view can be built before the cell appears and kept after it is erased.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use homeui_model::DeviceData;
/// use homeui_model::protocol::MemoryRouter;
///
/// let router = Arc::new(MemoryRouter::new());
/// let model = DeviceData::new(Arc::clone(&router));
/// model.attach().unwrap();
///
/// let proxy = model.proxy("kitchen/temp1");
/// assert!(!proxy.exists());
/// assert_eq!(proxy.value(), None);
///
/// router.publish("/devices/kitchen/controls/temp1/meta/type", "temperature", true);
/// router.publish("/devices/kitchen/controls/temp1", "21.5", true);
/// assert!(proxy.is_complete());
/// assert_eq!(proxy.units(), "°C");
/// ```
#[derive(Debug, Clone)]
pub struct CellProxy {
    model: DeviceData,
    id: String,
}

impl CellProxy {
    pub(crate) fn new(model: DeviceData, id: String) -> Self {
        Self { model, id }
    }

    fn read<T>(&self, f: impl FnOnce(&Cell) -> T) -> T {
        self.model
            .with_registry(|registry| f(registry.find(&self.id).unwrap_or(Cell::placeholder())))
    }

    /// Returns the id this proxy refers to.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` if the id currently resolves to a live cell.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.model
            .with_registry(|registry| registry.find(&self.id).is_some())
    }

    /// Returns `true` if the id resolves to a live, complete cell.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.model
            .with_registry(|registry| registry.find(&self.id).is_some_and(Cell::is_complete))
    }

    /// Returns a snapshot of the resolved cell, or of the placeholder.
    #[must_use]
    pub fn snapshot(&self) -> Cell {
        self.read(Cell::clone)
    }

    /// Returns the device id of the resolved cell.
    #[must_use]
    pub fn device_id(&self) -> String {
        self.read(|cell| cell.device_id().to_string())
    }

    /// Returns the control id of the resolved cell.
    #[must_use]
    pub fn control_id(&self) -> String {
        self.read(|cell| cell.control_id().to_string())
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.read(|cell| cell.name().to_string())
    }

    /// Returns the declared type.
    #[must_use]
    pub fn cell_type(&self) -> CellType {
        self.read(|cell| cell.cell_type().clone())
    }

    /// Returns the value kind.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        self.read(Cell::value_kind)
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Option<CellValue> {
        self.read(|cell| cell.value().cloned())
    }

    /// Returns the current value as a payload string.
    #[must_use]
    pub fn string_value(&self) -> Option<String> {
        self.read(Cell::string_value)
    }

    /// Returns the display units.
    #[must_use]
    pub fn units(&self) -> String {
        self.read(|cell| cell.units().to_string())
    }

    /// Returns the read-only flag.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read(Cell::read_only)
    }

    /// Returns the error flag.
    #[must_use]
    pub fn error(&self) -> bool {
        self.read(Cell::error)
    }

    /// Returns the lower bound.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.read(Cell::min)
    }

    /// Returns the upper bound.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.read(Cell::max)
    }

    /// Returns the step.
    #[must_use]
    pub fn step(&self) -> Option<f64> {
        self.read(Cell::step)
    }

    /// Requests a write. Ignored unless the id resolves to a live cell.
    ///
    /// # Errors
    ///
    /// Returns error if the router fails to publish the write.
    pub fn send_value(&self, value: impl Into<CellValue>) -> Result<()> {
        self.model.send_value(&self.id, value)
    }

    /// Requests a write of a value that may have failed validation.
    ///
    /// `None` is dropped without touching the cell.
    ///
    /// # Errors
    ///
    /// Returns error if the router fails to publish the write.
    pub fn set_value(&self, value: Option<CellValue>) -> Result<()> {
        match value {
            Some(value) => self.send_value(value),
            None => {
                tracing::trace!(cell = %self.id, "Dropping invalid value");
                Ok(())
            }
        }
    }
}
