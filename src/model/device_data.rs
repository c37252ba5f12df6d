// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared handle on the device model.
//!
//! All registry mutation goes through one `parking_lot::Mutex`. The lock is
//! never held while calling into the router or publishing events, so a
//! router that delivers synchronously may call back into the model.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use homeui_model::DeviceData;
//! use homeui_model::protocol::MemoryRouter;
//! use homeui_model::types::CellValue;
//!
//! # fn main() -> homeui_model::Result<()> {
//! let router = Arc::new(MemoryRouter::new());
//! router.publish("/devices/relay/controls/k1/meta/type", "switch", true);
//! router.publish("/devices/relay/controls/k1", "0", true);
//!
//! let model = DeviceData::new(Arc::clone(&router));
//! model.attach()?;
//! assert_eq!(model.cell_ids(), vec!["relay/k1".to_string()]);
//!
//! model.send_value("relay/k1", CellValue::Boolean(true))?;
//! let sent = router.published_matching("/devices/+/controls/+/on");
//! assert_eq!(sent[0].payload, "1");
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::cell::Cell;
use crate::error::Result;
use crate::event::{EventBus, ModelEvent};
use crate::protocol::{Message, MessageHandler, MessageRouter};
use crate::registry::{CellRegistry, Device};
use crate::types::{CellType, CellValue};

use super::CellProxy;

/// Topic patterns the model subscribes to.
pub const SUBSCRIPTION_PATTERNS: [&str; 10] = [
    "/devices/+/meta/name",
    "/devices/+/controls/+",
    "/devices/+/controls/+/meta/type",
    "/devices/+/controls/+/meta/name",
    "/devices/+/controls/+/meta/units",
    "/devices/+/controls/+/meta/readonly",
    "/devices/+/controls/+/meta/error",
    "/devices/+/controls/+/meta/min",
    "/devices/+/controls/+/meta/max",
    "/devices/+/controls/+/meta/step",
];

/// Shared, cloneable handle on the device model.
#[derive(Clone)]
pub struct DeviceData {
    inner: Arc<DeviceDataInner>,
}

struct DeviceDataInner {
    registry: Mutex<CellRegistry>,
    router: Arc<dyn MessageRouter>,
    events: EventBus,
}

impl DeviceData {
    /// Creates an empty model bound to `router`.
    ///
    /// Nothing is received until [`attach`](Self::attach) is called.
    #[must_use]
    pub fn new<R: MessageRouter + 'static>(router: R) -> Self {
        Self::with_event_bus(router, EventBus::new())
    }

    /// Creates an empty model publishing its events on `events`.
    #[must_use]
    pub fn with_event_bus<R: MessageRouter + 'static>(router: R, events: EventBus) -> Self {
        Self {
            inner: Arc::new(DeviceDataInner {
                registry: Mutex::new(CellRegistry::new()),
                router: Arc::new(router),
                events,
            }),
        }
    }

    /// Subscribes to every device topic.
    ///
    /// Retained state is replayed into the model before this returns when
    /// the router delivers synchronously. Every later reconnection of the
    /// router resets the model before the retained state is replayed again.
    ///
    /// # Errors
    ///
    /// Returns error if the router rejects a subscription.
    pub fn attach(&self) -> Result<()> {
        let weak: Weak<DeviceDataInner> = Arc::downgrade(&self.inner);
        let on_connect = weak.clone();
        self.inner.router.add_connect_listener(Arc::new(move || {
            if let Some(inner) = on_connect.upgrade() {
                tracing::debug!("Router reconnected, rebuilding device model");
                DeviceData { inner }.reset();
            }
        }));

        let handler: MessageHandler = Arc::new(move |message: &Message| {
            if let Some(inner) = weak.upgrade() {
                DeviceData { inner }.handle_message(message);
            }
        });

        for pattern in SUBSCRIPTION_PATTERNS {
            self.inner
                .router
                .add_sticky_subscription(pattern, Arc::clone(&handler))?;
        }
        tracing::debug!(patterns = SUBSCRIPTION_PATTERNS.len(), "Device model attached");
        Ok(())
    }

    /// Applies one incoming message.
    ///
    /// Malformed topics are logged and dropped.
    pub fn handle_message(&self, message: &Message) {
        let result = self
            .inner
            .registry
            .lock()
            .dispatch(&message.topic, &message.payload);

        match result {
            Ok(events) => self.inner.events.publish_all(events),
            Err(e) => {
                tracing::warn!(topic = %message.topic, error = %e, "Dropping message");
            }
        }
    }

    /// Requests a write on a cell.
    ///
    /// Unknown, incomplete and read-only cells ignore the request. Otherwise
    /// the value is stored locally and published to the cell's `on` topic.
    /// A cell update event is published only if the stored state changed.
    ///
    /// # Errors
    ///
    /// Returns error if the router fails to publish the write.
    pub fn send_value(&self, id: &str, value: impl Into<CellValue>) -> Result<()> {
        let (message, changed) = {
            let mut registry = self.inner.registry.lock();
            let before = registry.find(id).cloned();
            let Some(message) = registry.send_value(id, value.into()) else {
                return Ok(());
            };
            (message, before.as_ref() != registry.find(id))
        };

        tracing::debug!(
            cell = %id,
            topic = %message.topic,
            payload = %message.payload,
            "Sending value"
        );
        if changed {
            self.inner.events.publish(ModelEvent::cell_updated(id));
        }
        if let Err(e) = self.inner.router.send(&message.topic, &message.payload, false) {
            tracing::warn!(topic = %message.topic, error = %e, "Failed to publish value");
            return Err(e.into());
        }
        Ok(())
    }

    /// Returns a proxy for the cell id. The cell need not exist.
    #[must_use]
    pub fn proxy(&self, id: impl Into<String>) -> CellProxy {
        CellProxy::new(self.clone(), id.into())
    }

    /// Returns a snapshot of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if no such cell
    /// exists.
    pub fn cell(&self, id: &str) -> Result<Cell> {
        self.inner.registry.lock().lookup(id).cloned()
    }

    /// Returns a snapshot of a cell, if present.
    #[must_use]
    pub fn find_cell(&self, id: &str) -> Option<Cell> {
        self.inner.registry.lock().find(id).cloned()
    }

    /// Returns the ids of all complete cells, sorted.
    #[must_use]
    pub fn cell_ids(&self) -> Vec<String> {
        self.inner.registry.lock().list_complete_ids()
    }

    /// Returns the ids of complete cells of the given type, sorted.
    #[must_use]
    pub fn cell_ids_by_type(&self, cell_type: &CellType) -> Vec<String> {
        self.inner.registry.lock().complete_ids_by_type(cell_type)
    }

    /// Returns the ids of complete cells accepted by `predicate`, sorted.
    #[must_use]
    pub fn cell_ids_by(&self, predicate: impl Fn(&Cell) -> bool) -> Vec<String> {
        self.inner.registry.lock().list_complete_ids_by(predicate)
    }

    /// Returns a snapshot of all devices, in id order.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.inner.registry.lock().devices().iter().cloned().collect()
    }

    /// Returns a snapshot of a device.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<Device> {
        self.inner.registry.lock().device(id).cloned()
    }

    /// Runs `f` with shared access to the registry.
    ///
    /// The model lock is held while `f` runs; `f` must not call back into
    /// this handle.
    pub fn with_registry<T>(&self, f: impl FnOnce(&CellRegistry) -> T) -> T {
        f(&self.inner.registry.lock())
    }

    /// Subscribes to model change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Drops every cell and device, ahead of a full resubscription.
    ///
    /// Removal events are published for everything that was dropped.
    pub fn reset(&self) {
        let events: Vec<ModelEvent> = {
            let mut registry = self.inner.registry.lock();
            let cells = registry.iter().map(|cell| ModelEvent::cell_removed(cell.id()));
            let devices = registry
                .devices()
                .iter()
                .map(|device| ModelEvent::device_removed(device.id()));
            let events: Vec<ModelEvent> = cells.chain(devices).collect();
            registry.clear();
            events
        };
        tracing::debug!(removed = events.len(), "Device model reset");
        self.inner.events.publish_all(events);
    }
}

impl std::fmt::Debug for DeviceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.registry.lock();
        f.debug_struct("DeviceData")
            .field("cells", &registry.len())
            .field("devices", &registry.devices().len())
            .field("subscribers", &self.inner.events.subscriber_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MemoryRouter;

    fn attached() -> (Arc<MemoryRouter>, DeviceData) {
        let router = Arc::new(MemoryRouter::new());
        let model = DeviceData::new(Arc::clone(&router));
        model.attach().unwrap();
        (router, model)
    }

    #[test]
    fn attach_subscribes_all_patterns() {
        let (router, _model) = attached();
        assert_eq!(router.subscription_count(), SUBSCRIPTION_PATTERNS.len());
    }

    #[test]
    fn handler_releases_model_when_dropped() {
        let (router, model) = attached();
        drop(model);
        router.publish("/devices/a/controls/b/meta/type", "text", true);
    }

    #[test]
    fn malformed_message_is_dropped() {
        let (_router, model) = attached();
        model.handle_message(&Message::new("/devices/a", "x"));
        assert!(model.devices().is_empty());
    }

    #[test]
    fn send_value_publishes_without_retain() {
        let (router, model) = attached();
        router.publish("/devices/a/controls/t/meta/type", "temperature", true);
        router.publish("/devices/a/controls/t", "20", true);

        model.send_value("a/t", 22.5).unwrap();

        let sent = router.published_matching("/devices/a/controls/t/on");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, "22.5");
        assert!(!sent[0].retain);
        assert_eq!(
            model.cell("a/t").unwrap().value(),
            Some(&CellValue::Number(22.5))
        );
    }

    #[tokio::test]
    async fn unchanged_write_publishes_no_event() {
        let (router, model) = attached();
        router.publish("/devices/a/controls/t/meta/type", "temperature", true);
        router.publish("/devices/a/controls/t", "20", true);
        router.publish("/devices/a/controls/b/meta/type", "pushbutton", true);
        let mut rx = model.subscribe();

        model.send_value("a/t", 20).unwrap();
        model.send_value("a/b", "1").unwrap();
        model.send_value("a/t", 21).unwrap();

        assert_eq!(router.published_matching("/devices/a/controls/+/on").len(), 3);
        assert_eq!(rx.recv().await.unwrap(), ModelEvent::cell_updated("a/t"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reconnect_drops_state_missing_from_retained() {
        let (router, model) = attached();
        router.publish("/devices/a/controls/x/meta/type", "switch", true);
        router.publish("/devices/a/controls/x", "1", true);
        router.publish("/devices/b/controls/y/meta/type", "text", true);

        router.forget_retained("/devices/a/controls/x/meta/type");
        router.forget_retained("/devices/a/controls/x");
        router.reconnect();

        assert!(model.find_cell("a/x").is_none());
        assert!(model.device("a").is_none());
        assert_eq!(model.cell_ids(), vec!["b/y".to_string()]);
    }

    #[test]
    fn refused_write_publishes_nothing() {
        let (router, model) = attached();
        model.send_value("nosuch/cell", "x").unwrap();
        assert!(router.published().is_empty());
    }

    #[tokio::test]
    async fn dispatch_publishes_events() {
        let (router, model) = attached();
        let mut rx = model.subscribe();

        router.publish("/devices/kitchen/meta/name", "Kitchen", true);
        assert_eq!(
            rx.recv().await.unwrap(),
            ModelEvent::device_updated("kitchen")
        );
    }

    #[tokio::test]
    async fn reset_clears_and_notifies() {
        let (router, model) = attached();
        router.publish("/devices/a/controls/x/meta/type", "text", true);
        let mut rx = model.subscribe();

        model.reset();
        assert!(model.find_cell("a/x").is_none());
        assert!(model.devices().is_empty());
        assert_eq!(rx.recv().await.unwrap(), ModelEvent::cell_removed("a/x"));
        assert_eq!(rx.recv().await.unwrap(), ModelEvent::device_removed("a"));
    }

    #[test]
    fn reattach_after_reset_rebuilds_from_retained() {
        let (router, model) = attached();
        router.publish("/devices/a/controls/x/meta/type", "switch", true);
        router.publish("/devices/a/controls/x", "1", true);

        model.reset();
        router.replay();
        assert_eq!(model.cell_ids(), vec!["a/x".to_string()]);
    }
}
