// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notifications for the device model.
//!
//! Every message that changes the model produces [`ModelEvent`]s, which
//! [`EventBus`] broadcasts to any number of subscribers. Views use them to
//! refresh only what changed instead of polling the registry.
//!
//! # Examples
//!
//! ```
//! use homeui_model::event::{EventBus, ModelEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(ModelEvent::CellUpdated {
//!     id: "kitchen/temp1".to_string(),
//! });
//! assert_eq!(rx.try_recv().unwrap().id(), "kitchen/temp1");
//! ```

mod event_bus;
mod model_event;

pub use event_bus::EventBus;
pub use model_event::ModelEvent;
