// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `homeui_model` - Live model of home automation devices and controls.
//!
//! Devices publish their state on a pub/sub bus under `/devices/...`. This
//! library projects that message stream into an in-memory model: devices,
//! their controls ("cells"), typed values and metadata. Writes go back to the
//! bus on the control's `on` topic.
//!
//! # Features
//!
//! - **Topic parsing**: `/devices/<dev>/controls/<ctrl>[/meta/<field>]`
//! - **Typed values**: booleans, numbers, RGB colors, text and pushbuttons,
//!   decoded from the declared control type
//! - **Lifecycle**: cells are listed on their device once complete, erased
//!   once both type and value are gone; empty devices are collected
//! - **Change events**: broadcast of cell and device updates
//! - **Routers**: in-process router, and an MQTT router (feature `mqtt`)
//!
//! # Quick Start
//!
//! ## In-process router
//!
//! ```
//! use std::sync::Arc;
//! use homeui_model::{DeviceData, MemoryRouter};
//!
//! # fn main() -> homeui_model::Result<()> {
//! let router = Arc::new(MemoryRouter::new());
//! let model = DeviceData::new(Arc::clone(&router));
//! model.attach()?;
//!
//! router.publish("/devices/kitchen/controls/temp1/meta/type", "temperature", true);
//! router.publish("/devices/kitchen/controls/temp1", "21.5", true);
//!
//! let temp = model.proxy("kitchen/temp1");
//! assert!(temp.is_complete());
//! assert_eq!(temp.string_value().as_deref(), Some("21.5"));
//! assert_eq!(temp.units(), "°C");
//! # Ok(())
//! # }
//! ```
//!
//! ## MQTT broker
//!
//! ```no_run
//! use homeui_model::{DeviceData, MqttRouter};
//!
//! #[tokio::main]
//! async fn main() -> homeui_model::Result<()> {
//!     let router = MqttRouter::builder()
//!         .host("192.168.1.50")
//!         .credentials("user", "password")
//!         .build()
//!         .await?;
//!
//!     let model = DeviceData::new(router);
//!     model.attach()?;
//!
//!     let mut events = model.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{event}");
//!     }
//!     Ok(())
//! }
//! ```

mod cell;
pub mod error;
pub mod event;
pub mod model;
pub mod protocol;
pub mod registry;
pub mod topic;
pub mod types;

pub use cell::{Cell, PLACEHOLDER_ID};
pub use error::{Error, ProtocolError, Result};
pub use event::{EventBus, ModelEvent};
pub use model::{CellProxy, DeviceData};
pub use protocol::{ConnectListener, MemoryRouter, Message, MessageHandler, MessageRouter};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttRouter, MqttRouterBuilder, MqttRouterConfig};
pub use registry::{CellRegistry, Device, DeviceRegistry};
pub use types::{CellType, CellValue, RgbColor, ValueKind};
