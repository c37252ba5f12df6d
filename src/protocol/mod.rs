// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Message routers that feed the device model.
//!
//! The model never talks to a transport directly. It registers *sticky*
//! subscriptions on a [`MessageRouter`] and sends write requests through it.
//! A sticky subscription replays the latest retained message of every
//! matching topic as soon as it is added, then streams later publishes.
//!
//! Connect listeners run on every reconnection, before the sticky
//! subscriptions replay, so the model can start over from an empty state.
//!
//! # Routers
//!
//! - [`MemoryRouter`]: in-process router with a retained-message store
//! - [`MqttRouter`]: MQTT broker connection, retained messages give the
//!   sticky replay

mod memory_router;
#[cfg(feature = "mqtt")]
mod mqtt_router;

pub use memory_router::{MemoryRouter, PublishedMessage};
#[cfg(feature = "mqtt")]
pub use mqtt_router::{MqttRouter, MqttRouterBuilder, MqttRouterConfig};

use std::sync::Arc;

use crate::error::ProtocolError;

/// A message delivered to, or produced by, the model.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    /// Full topic, e.g. `/devices/kitchen/controls/temp1`.
    pub topic: String,
    /// Payload; empty means the value was removed.
    pub payload: String,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Callback invoked for every message matching a subscription.
pub type MessageHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Callback invoked when a router (re)connects.
pub type ConnectListener = Arc<dyn Fn() + Send + Sync>;

/// Publish/subscribe collaborator of the device model.
pub trait MessageRouter: Send + Sync {
    /// Subscribes `handler` to `pattern` (`+` and `#` wildcards).
    ///
    /// The handler is called once per currently retained matching topic right
    /// away, then on every later publish to a matching topic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the pattern is invalid or the subscription
    /// cannot be issued.
    fn add_sticky_subscription(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<(), ProtocolError>;

    /// Publishes `payload` to `topic`.
    ///
    /// `retain` controls whether future subscribers receive the payload.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the message cannot be queued.
    fn send(&self, topic: &str, payload: &str, retain: bool) -> Result<(), ProtocolError>;

    /// Registers `listener` to run on every reconnection.
    ///
    /// The listener runs before the sticky subscriptions are replayed. It is
    /// not called for a connection that is already up when it registers.
    fn add_connect_listener(&self, listener: ConnectListener);
}

impl<R: MessageRouter + ?Sized> MessageRouter for Arc<R> {
    fn add_sticky_subscription(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<(), ProtocolError> {
        (**self).add_sticky_subscription(pattern, handler)
    }

    fn add_connect_listener(&self, listener: ConnectListener) {
        (**self).add_connect_listener(listener);
    }

    fn send(&self, topic: &str, payload: &str, retain: bool) -> Result<(), ProtocolError> {
        (**self).send(topic, payload, retain)
    }
}

/// Clones the handlers whose pattern matches `topic`.
pub(crate) fn matching_handlers(
    subscriptions: &[(String, MessageHandler)],
    topic: &str,
) -> Vec<MessageHandler> {
    subscriptions
        .iter()
        .filter(|(pattern, _)| crate::topic::topic_matches(pattern, topic))
        .map(|(_, handler)| Arc::clone(handler))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_new() {
        let message = Message::new("/devices/a/controls/b", "1");
        assert_eq!(message.topic, "/devices/a/controls/b");
        assert_eq!(message.payload, "1");
    }

    #[test]
    fn matching_handlers_filters_by_pattern() {
        let handler: MessageHandler = Arc::new(|_: &Message| {});
        let subscriptions = vec![
            ("/devices/+/meta/name".to_string(), Arc::clone(&handler)),
            ("/devices/+/controls/+".to_string(), Arc::clone(&handler)),
            ("/devices/#".to_string(), handler),
        ];
        assert_eq!(
            matching_handlers(&subscriptions, "/devices/a/controls/b").len(),
            2
        );
        assert_eq!(matching_handlers(&subscriptions, "/other").len(), 0);
    }

    #[test]
    fn arc_router_delegates() {
        fn assert_router<T: MessageRouter>() {}
        assert_router::<Arc<MemoryRouter>>();
        assert_router::<Arc<dyn MessageRouter>>();
    }
}
