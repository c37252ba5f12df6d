// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for model events.

use tokio::sync::broadcast;

use super::ModelEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts [`ModelEvent`]s to every subscriber.
///
/// Backed by a tokio broadcast channel, so publishing never blocks and works
/// outside a runtime. A subscriber that falls more than the capacity behind
/// receives `RecvError::Lagged` and should resynchronise from the registry.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ModelEvent>,
}

impl EventBus {
    /// Creates an event bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an event bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes one event. Dropped silently when nobody listens.
    pub fn publish(&self, event: ModelEvent) {
        let _ = self.sender.send(event);
    }

    /// Publishes a batch of events in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = ModelEvent>) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        for event in events {
            let _ = self.sender.send(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
