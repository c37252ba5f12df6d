// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registries owning devices and cells.
//!
//! - [`DeviceRegistry`] - Device records (display name, explicit flag,
//!   sorted ids of complete cells)
//! - [`CellRegistry`] - Cell instances, and the dispatch of bus messages to
//!   them
//!
//! The cell registry owns the device registry: devices reference cells by id
//! only, and a device record exists exactly while it is explicitly named or
//! lists at least one complete cell.

mod cell_registry;
mod device_registry;

pub use cell_registry::CellRegistry;
pub use device_registry::{Device, DeviceRegistry};
