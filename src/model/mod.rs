// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live device model wired to a message router.
//!
//! [`DeviceData`] is the handle applications hold: it subscribes to the
//! device topics, keeps the registry up to date, publishes writes and
//! broadcasts change events. [`CellProxy`] gives a view on one cell that
//! stays valid whether or not the cell currently exists.

mod cell_proxy;
mod device_data;

pub use cell_proxy::CellProxy;
pub use device_data::{DeviceData, SUBSCRIPTION_PATTERNS};
